/// Unit of every normalized price
pub const PRICE_UNIT: &str = "c/kWh";

/// Round to three decimals
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Currency per MWh to currency-cents per kWh
pub fn mwh_to_cents_per_kwh(price: f64) -> f64 {
    round3(price / 10.0)
}
