use dtcl_core::CartType;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HardwareEvent {
    Connected,
    Disconnected,
    CartDetected { slot: u8, cart_type: CartType },
    CartRemoved { slot: u8 },
}
