//! Shipping details.
//!
//! The same form backs two things: the address typed in at checkout, and the
//! profile a signed-in customer saves for next time.

use serde::{Deserialize, Serialize};

use crate::types::Email;
use crate::validation::{ValidationErrors, optional_text, required_text};

const NAME_MAX: usize = 300;
const ADDRESS_MAX: usize = 300;
const LOCALITY_MAX: usize = 255;

/// Shipping fields exactly as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShippingForm {
    pub full_name: String,
    pub email: String,
    pub address1: String,
    pub address2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub zipcode: Option<String>,
}

/// Validated, trimmed shipping details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShippingInfo {
    pub full_name: String,
    pub email: Email,
    pub address1: String,
    pub address2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub zipcode: Option<String>,
}

impl ShippingForm {
    /// # Errors
    ///
    /// Returns every missing or malformed field. `full_name`, `email`,
    /// `address1`, and `city` are required.
    pub fn validate(self) -> Result<ShippingInfo, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let full_name = required_text(&mut errors, "full_name", &self.full_name, NAME_MAX);
        let address1 = required_text(&mut errors, "address1", &self.address1, ADDRESS_MAX);
        let address2 = optional_text(&mut errors, "address2", self.address2.as_deref(), ADDRESS_MAX);
        let city = required_text(&mut errors, "city", &self.city, LOCALITY_MAX);
        let state = optional_text(&mut errors, "state", self.state.as_deref(), LOCALITY_MAX);
        let zipcode = optional_text(&mut errors, "zipcode", self.zipcode.as_deref(), LOCALITY_MAX);

        let email = match Email::parse(&self.email) {
            Ok(email) => Some(email),
            Err(e) => {
                errors.add("email", e.to_string());
                None
            }
        };

        match email {
            Some(email) if errors.is_empty() => Ok(ShippingInfo {
                full_name,
                email,
                address1,
                address2,
                city,
                state,
                zipcode,
            }),
            _ => Err(errors),
        }
    }
}

impl ShippingInfo {
    /// The address as stored on an order: the non-empty address lines, city,
    /// state, and zipcode, one per line.
    #[must_use]
    pub fn formatted_address(&self) -> String {
        [
            Some(self.address1.as_str()),
            self.address2.as_deref(),
            Some(self.city.as_str()),
            self.state.as_deref(),
            self.zipcode.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|part| !part.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
    }
}
