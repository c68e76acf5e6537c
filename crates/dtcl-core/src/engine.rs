use crate::{FailurePolicy, SlotClass};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlotDecision {
    /// Go on to the next slot, or to the next iteration after the last one.
    Continue,
    /// Skip the rest of this iteration's slots.
    StopSlots,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotVerdict {
    pub message: String,
    pub decision: SlotDecision,
}

/// Pure decision rule applied after every slot write.
///
/// The last slot always yields a terminal message and `Continue`: no outcome
/// halts the multi-iteration loop. Earlier slots yield a continuation message
/// and `Continue`, except that `AbortSlots` turns a `Failure` into `StopSlots`.
pub fn decide_after_slot(slot: u8, class: SlotClass, code: i32, is_last: bool, policy: FailurePolicy) -> SlotVerdict {
    let what = match class {
        SlotClass::Success => format!("Slot {slot}: write completed"),
        SlotClass::MissingHeader => format!("Slot {slot}: cartridge header missing"),
        SlotClass::Failure => format!("Slot {slot}: write failed (code {code})"),
    };

    if is_last {
        return SlotVerdict { message: what, decision: SlotDecision::Continue };
    }

    match (class, policy) {
        (SlotClass::Failure, FailurePolicy::AbortSlots) => SlotVerdict {
            message: format!("{what}; skipping remaining slots"),
            decision: SlotDecision::StopSlots,
        },
        _ => SlotVerdict {
            message: format!("{what}; continuing with next slot"),
            decision: SlotDecision::Continue,
        },
    }
}
