pub mod broadcast;
pub mod socket;
pub mod targeted;
