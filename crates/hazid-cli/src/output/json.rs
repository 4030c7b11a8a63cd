use hazid_core::error::HazidError;
use serde::Serialize;

pub fn print<T: Serialize + ?Sized>(value: &T) -> Result<(), HazidError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
