pub mod asset_type;
pub mod helper;
