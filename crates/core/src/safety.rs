//! Safety-flag evaluator.
//!
//! The critical screening question (G6PD deficiency) carries a derived
//! boolean flag that the document assembler and the CRM payload must both
//! honour. The flag is re-evaluated from the current answer on every call;
//! it is never cached past the most recent answer change.

use crate::form::FormState;
use consent_types::{ScreeningAnswer, ScreeningKey};

/// Whether the current form state raises the contraindication flag.
///
/// True when the critical question is answered Yes or Unsure. An
/// unanswered question does not raise the flag; validation separately
/// rejects submission until every question is answered.
pub fn critical_flag(state: &FormState) -> bool {
    ScreeningKey::ALL
        .into_iter()
        .filter(|key| key.is_critical())
        .any(|key| answer_raises_flag(state.answer(key)))
}

/// Flag evaluation for a single answer to a critical question.
pub fn answer_raises_flag(answer: Option<ScreeningAnswer>) -> bool {
    answer.is_some_and(ScreeningAnswer::is_affirmative)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_follows_critical_answer() {
        let mut state = FormState::default();
        assert!(!critical_flag(&state));

        state.set_answer(ScreeningKey::G6pd, ScreeningAnswer::Yes);
        assert!(critical_flag(&state));

        state.set_answer(ScreeningKey::G6pd, ScreeningAnswer::Unsure);
        assert!(critical_flag(&state));

        state.set_answer(ScreeningKey::G6pd, ScreeningAnswer::No);
        assert!(!critical_flag(&state));
    }

    #[test]
    fn non_critical_affirmatives_do_not_raise_flag() {
        let mut state = FormState::default();
        state.set_answer(ScreeningKey::Allergies, ScreeningAnswer::Yes);
        state.set_answer(ScreeningKey::Bleeding, ScreeningAnswer::Yes);
        assert!(!critical_flag(&state));
    }

    #[test]
    fn flag_is_recomputed_not_cached() {
        let mut state = FormState::default();
        state.set_answer(ScreeningKey::G6pd, ScreeningAnswer::Unsure);
        assert!(critical_flag(&state));
        state.set_answer(ScreeningKey::G6pd, ScreeningAnswer::No);
        assert!(!critical_flag(&state));
        state.set_answer(ScreeningKey::G6pd, ScreeningAnswer::Yes);
        assert!(critical_flag(&state));
    }
}
