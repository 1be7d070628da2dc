pub mod source;
pub mod spot_price;
