pub mod assignments;
pub mod booking_status;
pub mod bookings;
pub mod reviews;
pub mod workload;
