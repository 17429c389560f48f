pub mod address;
pub mod booking;
pub mod booking_contact;
pub mod job_assignment;
pub mod pricing_option;
pub mod review;
pub mod service_offering;
pub mod technician;
