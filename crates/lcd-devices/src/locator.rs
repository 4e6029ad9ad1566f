//! Display discovery among attached serial endpoints.

use lcd_core::Result;

/// Source of candidate serial endpoints and the OS's descriptions of devices.
pub trait DeviceLocator: Send + Sync {
    /// Identifiers of every serial-capable endpoint, e.g. `"/dev/ttyACM0"`.
    fn serial_endpoints(&self) -> Result<Vec<String>>;

    /// Human-readable device descriptors. A descriptor names the endpoint it
    /// belongs to in parentheses, e.g. `"Matrix Orbital LK204 (COM3)"`.
    fn descriptors(&self) -> Result<Vec<String>>;
}

/// Ask `locator` for the first endpoint whose descriptor starts with
/// `vendor_prefix`. `Ok(None)` means no display is attached.
pub fn find_endpoint(locator: &dyn DeviceLocator, vendor_prefix: &str) -> Result<Option<String>> {
    let endpoints = locator.serial_endpoints()?;
    if endpoints.is_empty() {
        return Ok(None);
    }
    let descriptors = locator.descriptors()?;
    Ok(select_endpoint(&endpoints, &descriptors, vendor_prefix))
}

/// Pick the display endpoint.
///
/// Each endpoint is paired with the first descriptor containing
/// `"(<endpoint>)"`. Pairs whose descriptor does not start with
/// `vendor_prefix` are dropped, and the first remaining endpoint in
/// enumeration order wins.
///
/// # Examples
///
/// ```
/// use lcd_devices::locator::select_endpoint;
///
/// let endpoints = vec!["COM1".to_string(), "COM4".to_string()];
/// let descriptors = vec![
///     "Communications Port (COM1)".to_string(),
///     "Matrix Orbital LK204 (COM4)".to_string(),
/// ];
/// assert_eq!(
///     select_endpoint(&endpoints, &descriptors, "Matrix Orbital"),
///     Some("COM4".to_string())
/// );
/// ```
pub fn select_endpoint(
    endpoints: &[String],
    descriptors: &[String],
    vendor_prefix: &str,
) -> Option<String> {
    endpoints
        .iter()
        .filter_map(|endpoint| {
            let tag = format!("({endpoint})");
            descriptors
                .iter()
                .find(|d| d.contains(&tag))
                .map(|d| (endpoint, d))
        })
        .find(|(_, descriptor)| descriptor.starts_with(vendor_prefix))
        .map(|(endpoint, _)| endpoint.clone())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
