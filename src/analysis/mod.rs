pub mod dct;
pub mod entropy;
pub mod histogram;
pub mod localization;
pub mod tiling;
