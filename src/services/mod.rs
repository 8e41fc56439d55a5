pub mod iloveimg;
pub mod staging;
pub mod upscaler;
