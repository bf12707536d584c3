pub mod oanda;
pub mod util;
