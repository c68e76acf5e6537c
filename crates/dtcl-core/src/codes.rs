//! Integer result codes returned by the hardware write operation.

use crate::model::SlotClass;

pub const DTCL_SUCCESS: i32 = 0;
/// No writer could be resolved, or the board never answered.
pub const DTCL_NO_RESPONSE: i32 = 1;
/// The cartridge answered but its header block is absent.
pub const DTCL_MISSING_HEADER: i32 = 2;

impl SlotClass {
    pub fn from_code(code: i32) -> Self {
        match code {
            DTCL_SUCCESS => SlotClass::Success,
            DTCL_MISSING_HEADER => SlotClass::MissingHeader,
            _ => SlotClass::Failure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_codes() {
        assert_eq!(SlotClass::from_code(DTCL_SUCCESS), SlotClass::Success);
        assert_eq!(SlotClass::from_code(DTCL_MISSING_HEADER), SlotClass::MissingHeader);
        assert_eq!(SlotClass::from_code(DTCL_NO_RESPONSE), SlotClass::Failure);
        assert_eq!(SlotClass::from_code(-7), SlotClass::Failure);
        assert_eq!(SlotClass::from_code(42), SlotClass::Failure);
    }
}
