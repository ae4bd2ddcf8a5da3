//! Clinic identity rendered into documents and notifications.

/// Identity block stamped on every generated document.
#[derive(Debug, Clone)]
pub struct ClinicIdentity {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub contact_email: String,
}

impl ClinicIdentity {
    /// The running footer line: `<Clinic> | <address> | <phone>`.
    pub fn footer_line(&self) -> String {
        format!("{} | {} | {}", self.name, self.address, self.phone)
    }
}

impl Default for ClinicIdentity {
    fn default() -> Self {
        Self {
            name: "Range Medical".to_string(),
            address: "1901 Westcliff Dr, Suite 10, Newport Beach, CA 92660".to_string(),
            phone: "(949) 997-3988".to_string(),
            contact_email: "info@range-medical.com".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn footer_line_joins_identity_with_pipes() {
        let clinic = ClinicIdentity::default();
        assert_eq!(
            clinic.footer_line(),
            "Range Medical | 1901 Westcliff Dr, Suite 10, Newport Beach, CA 92660 | (949) 997-3988"
        );
    }
}
