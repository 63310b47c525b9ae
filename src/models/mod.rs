pub mod booking;
pub mod hotel;
pub mod room_type;
pub mod user;

pub use booking::{Booking, BookingStatus, GuestInfo, OwnerDecision};
pub use hotel::{Hotel, OwnerHotelSummary};
pub use room_type::RoomType;
pub use user::{Role, User};
