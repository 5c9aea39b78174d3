pub mod hrv;
pub mod pti;
pub mod rr;
