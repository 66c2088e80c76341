//! In-memory representation of a classic CAN frame exchanged with the TWAI
//! peripheral (receive path, transmit path and event payloads).
use embedded_can::{ExtendedId, Id, StandardId};

/// Maximum payload of a classic CAN frame.
pub const MAX_DATA_LEN: usize = 8;

//==================================================================================FLAGS
/// Per-frame transmission flags understood by the TWAI peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameFlags {
    /// Transmit once, without automatic retransmission on error or lost arbitration.
    pub single_shot: bool,
    /// Also deliver the frame to the local receive path.
    pub self_reception: bool,
}

//==================================================================================TWAI_FRAME
/// Arbitration id, payload and flags of one CAN 2.0 frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwaiFrame {
    id: Id,
    remote: bool,
    dlc: u8,
    data: [u8; MAX_DATA_LEN],
    flags: FrameFlags,
}

impl TwaiFrame {
    /// Create a data frame. Returns `None` when `data` exceeds eight bytes.
    pub fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        if data.len() > MAX_DATA_LEN {
            return None;
        }
        let mut payload = [0u8; MAX_DATA_LEN];
        payload[..data.len()].copy_from_slice(data);
        Some(Self {
            id: id.into(),
            remote: false,
            dlc: data.len() as u8,
            data: payload,
            flags: FrameFlags::default(),
        })
    }

    /// Create a remote frame requesting `dlc` bytes. Returns `None` for `dlc > 8`.
    pub fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
        if dlc > MAX_DATA_LEN {
            return None;
        }
        Some(Self {
            id: id.into(),
            remote: true,
            dlc: dlc as u8,
            data: [0; MAX_DATA_LEN],
            flags: FrameFlags::default(),
        })
    }

    /// Replace the transmission flags.
    #[must_use]
    pub fn with_flags(mut self, flags: FrameFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    /// Identifier as a raw integer (11 or 29 significant bits).
    pub fn raw_id(&self) -> u32 {
        match self.id {
            Id::Standard(id) => u32::from(id.as_raw()),
            Id::Extended(id) => id.as_raw(),
        }
    }

    pub fn is_extended(&self) -> bool {
        matches!(self.id, Id::Extended(_))
    }

    pub fn is_remote_frame(&self) -> bool {
        self.remote
    }

    pub fn dlc(&self) -> usize {
        self.dlc as usize
    }

    /// Payload bytes. Always empty for remote frames.
    pub fn data(&self) -> &[u8] {
        if self.remote {
            &[]
        } else {
            &self.data[..self.dlc as usize]
        }
    }

    pub fn flags(&self) -> FrameFlags {
        self.flags
    }
}

impl embedded_can::Frame for TwaiFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        TwaiFrame::new(id, data)
    }

    fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
        TwaiFrame::new_remote(id, dlc)
    }

    #[inline]
    fn is_extended(&self) -> bool {
        self.is_extended()
    }

    #[inline]
    fn is_remote_frame(&self) -> bool {
        self.is_remote_frame()
    }

    #[inline]
    fn id(&self) -> Id {
        self.id()
    }

    #[inline]
    fn dlc(&self) -> usize {
        self.dlc()
    }

    fn data(&self) -> &[u8] {
        self.data()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TwaiFrame {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "TwaiFrame {{ id: {=u32:#x}, extended: {=bool}, remote: {=bool}, data: {=[u8]} }}",
            self.raw_id(),
            self.is_extended(),
            self.remote,
            self.data()
        );
    }
}

/// Build an [`Id`] from a raw value and the extended flag.
///
/// Returns `None` when `raw` does not fit in 11 (standard) or 29 (extended) bits.
pub fn id_from_raw(raw: u32, extended: bool) -> Option<Id> {
    if extended {
        ExtendedId::new(raw).map(Id::Extended)
    } else {
        u16::try_from(raw)
            .ok()
            .and_then(StandardId::new)
            .map(Id::Standard)
    }
}
