//! Synthetic lead generation.

use chrono::{DateTime, Utc};
use growthos_core::{Lead, LeadId, Mode};
use rand::Rng;

const FIRST_NAMES: [&str; 8] = [
    "Sarah", "Jennifer", "Maria", "Lisa", "Amanda", "Jessica", "Michelle", "Emily",
];
const LAST_INITIALS: [&str; 8] = ["M", "K", "R", "S", "J", "T", "P", "L"];

/// Random display name, e.g. `"Maria K."`.
#[must_use]
pub fn random_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let first = FIRST_NAMES[rng.gen_range(0..FIRST_NAMES.len())];
    let last = LAST_INITIALS[rng.gen_range(0..LAST_INITIALS.len())];
    format!("{first} {last}.")
}

/// Random phone number in the 555 block, e.g. `"(555) 123-4567"`.
#[must_use]
pub fn random_phone<R: Rng + ?Sized>(rng: &mut R) -> String {
    let exchange: u32 = rng.gen_range(100..=999);
    let line: u32 = rng.gen_range(1000..=9999);
    format!("(555) {exchange}-{line}")
}

/// Fresh lead in the `lead` stage.
#[must_use]
pub fn generate_lead(mode: Mode, created_at: DateTime<Utc>) -> Lead {
    let mut rng = rand::thread_rng();
    Lead::new(
        LeadId::generate(),
        random_name(&mut rng),
        random_phone(&mut rng),
        mode,
        created_at,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use growthos_core::Stage;

    #[test]
    fn test_name_shape() {
        let mut rng = rand::thread_rng();
        for _ in 0..32 {
            let name = random_name(&mut rng);
            let (first, last) = name.split_once(' ').unwrap();
            assert!(FIRST_NAMES.contains(&first));
            assert!(last.ends_with('.'));
            assert!(LAST_INITIALS.contains(&last.trim_end_matches('.')));
        }
    }

    #[test]
    fn test_phone_shape() {
        let mut rng = rand::thread_rng();
        for _ in 0..32 {
            let phone = random_phone(&mut rng);
            assert_eq!(phone.len(), 14);
            assert!(phone.starts_with("(555) "));
            assert_eq!(&phone[9..10], "-");
        }
    }

    #[test]
    fn test_generate_lead() {
        let lead = generate_lead(Mode::Legacy, Utc::now());
        assert_eq!(lead.id.as_str().len(), 8);
        assert_eq!(lead.stage, Stage::Lead);
        assert_eq!(lead.mode, Mode::Legacy);
        assert_eq!(lead.revenue, 0);
        assert!(lead.messages.is_empty());
        assert!(lead.appointment_at.is_none());
    }
}
