//! Data model for peripheral devices

mod device;
mod device_id;
mod device_type;

pub use device::{Control, DeviceRecord};
pub use device_id::DeviceId;
pub use device_type::{DeviceType, GAIN_TAG};
