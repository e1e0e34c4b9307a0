pub mod staff;

pub use staff::Staff;
