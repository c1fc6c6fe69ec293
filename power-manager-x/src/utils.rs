/// Scales a raw battery sample against a raw sample of the internal reference.
///
/// The result is only meaningful for a non-zero `reference_raw`; callers are expected to check
/// the output with [`f32::is_finite`].
pub fn adc_convert_to_voltage(battery_raw: u16, reference_raw: u16, internal_vref: f32, divider: f32) -> f32 {
    (battery_raw as f32 / (reference_raw as f32 / internal_vref)) * divider
}

/// Returns a number from 0 to 9 where 0 is completely discharged and 9 is 90% charged.
///
/// Each table entry is the lower voltage bound of a 10%-wide bucket, in ascending order. A voltage
/// sitting exactly on an entry belongs to that entry's bucket.
pub fn charge_bucket_from_voltage(voltage: f32, table: &[f32; 10]) -> u8 {
    if voltage < table[0] {
        return 0;
    }
    if voltage > table[9] {
        return 9;
    }

    // NOTE: Linear scan is fine for 10 entries. NaN never compares greater, so it lands in bucket 0.
    table.iter().take_while(|threshold| voltage > **threshold).count() as u8
}
