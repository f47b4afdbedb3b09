//! Random MAC addresses for container devices.

use rand::Rng;

/// Separator between octets.
pub const MAC_DELIMITER: &str = "-";

/// Generate a random MAC address such as `a1-2b-3c-4d-5e-6f`.
///
/// No uniqueness against the controller's existing addresses is attempted.
#[must_use]
pub fn random_mac_address() -> String {
    mac_address_from(&mut rand::thread_rng())
}

/// Generate a MAC address from the given random source.
pub fn mac_address_from<R: Rng>(rng: &mut R) -> String {
    let octets: [u8; 6] = rng.gen();
    format_mac(octets)
}

fn format_mac(octets: [u8; 6]) -> String {
    octets
        .iter()
        .map(|o| format!("{o:02x}"))
        .collect::<Vec<_>>()
        .join(MAC_DELIMITER)
}
