//! Decoding of job status bitmasks into reason symbols.
//!
//! The transport reports why a job is blocked or why it failed as a `u64`
//! where bit *i* stands for reason enumerant *i*. Symbols are looked up
//! through an ordered table: for every set bit below the bound, the first
//! table entry whose mask intersects the bits still pending wins. With tables
//! listed in bit order this yields one symbol per set bit, in bit order.

use std::fmt;

use serde::Serialize;

/// One row of a reason table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReasonEntry {
    pub mask: u64,
    pub symbol: &'static str,
}

impl ReasonEntry {
    pub const fn new(bit: u32, symbol: &'static str) -> Self {
        Self {
            mask: 1 << bit,
            symbol,
        }
    }
}

macro_rules! reason_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $bound:ident, $table:ident {
            $($variant:ident => $symbol:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u32)]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant,)+];

            pub const fn bit(self) -> u32 {
                self as u32
            }

            pub const fn mask(self) -> u64 {
                1 << (self as u32)
            }

            pub const fn symbol(self) -> &'static str {
                match self {
                    $(Self::$variant => $symbol,)+
                }
            }
        }

        /// Table consulted when decoding this reason family, in bit order.
        pub const $table: &[ReasonEntry] = &[
            $(ReasonEntry::new($name::$variant as u32, $symbol),)+
        ];

        impl $name {
            /// Number of enumerants; bits at or above this index are never inspected.
            pub const $bound: u32 = $table.len() as u32;
        }
    };
}

reason_enum! {
    /// Transient conditions that keep a job from progressing.
    /// 使作業暫時無法繼續的狀況。
    BlockedReason, MAX_STATE, BLOCKED_REASON_TABLE {
        UnableToConnect => "device-offline",
        Busy => "device-busy",
        Cancelled => "print-job-cancelled",
        OutOfPaper => "input-media-supply-empty",
        OutOfInk => "marker-ink-empty",
        OutOfToner => "marker-toner-empty",
        Jammed => "jam",
        DoorOpen => "cover-door-open",
        ServiceRequest => "service-request",
        Paused => "paused",
        Stopped => "stopped",
        LowOnInk => "marker-ink-almost-empty",
        LowOnToner => "marker-toner-almost-empty",
        InputCannotFeedSizeSelected => "input-cannot-feed-size-selected",
        InterlockError => "interlock-error",
        OutputTrayMissing => "output-tray-missing",
        BanderError => "bander-error",
        BinderError => "binder-error",
        PowerError => "power-error",
        CleanerError => "cleaner-error",
        InputTrayError => "input-tray-error",
        InserterError => "inserter-error",
        InterpreterError => "interpreter-error",
        MakeEnvelopeError => "make-envelope-error",
        MarkerError => "marker-error",
        MediaError => "media-error",
        PerforaterError => "perforater-error",
        PuncherError => "puncher-error",
        SeparationCutterError => "separation-cutter-error",
        SheetRotatorError => "sheet-rotator-error",
        SlitterError => "slitter-error",
        StackerError => "stacker-error",
        StaplerError => "stapler-error",
        StitcherError => "stitcher-error",
        SubunitError => "subunit-error",
        TrimmerError => "trimmer-error",
        WrapperError => "wrapper-error",
        ClientError => "client-error",
        ServerError => "server-error",
        AlertRemovalOfBinaryChangeEntry => "alert-removal-of-binary-change-entry",
        ConfigurationChanged => "configuration-changed",
        ConnectingToDevice => "connecting-to-device",
        DeveloperError => "developer-error",
        HoldNewJobs => "hold-new-jobs",
        OpcLifeOver => "opc-life-over",
        SpoolAreaFull => "spool-area-full",
        TimedOut => "timed-out",
        Shutdown => "shutdown",
        PrinterManualReset => "printer-manual-reset",
        PrinterNmsReset => "printer-nms-reset",
    }
}

reason_enum! {
    /// Terminal conditions that ended a job unsuccessfully.
    /// 使作業以失敗結束的狀況。
    FailedReason, MAX_VALUE, FAILED_REASON_TABLE {
        UnableToConnect => "device-offline",
        AbortedBySystem => "aborted-by-system",
        UnsupportedCompression => "unsupported-compression",
        CompressionError => "compression-error",
        UnsupportedDocumentFormat => "unsupported-document-format",
        DocumentFormatError => "document-format-error",
        ServiceOffline => "service-off-line",
        DocumentPasswordError => "document-password-error",
        DocumentPermissionError => "document-permission-error",
        DocumentSecurityError => "document-security-error",
        DocumentUnprintableError => "document-unprintable-error",
        DocumentAccessError => "document-access-error",
        SubmissionInterrupted => "submission-interrupted",
        AuthorizationFailed => "job-authorization-failed",
        AccountClosed => "job-account-closed",
        AccountInfoNeeded => "job-account-info-needed",
        AccountLimitReached => "job-account-limit-reached",
    }
}

/// Which reason family a bitmask belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasonKind {
    Blocked,
    Failed,
}

impl ReasonKind {
    pub const fn table(self) -> &'static [ReasonEntry] {
        match self {
            Self::Blocked => BLOCKED_REASON_TABLE,
            Self::Failed => FAILED_REASON_TABLE,
        }
    }

    pub const fn bound(self) -> u32 {
        match self {
            Self::Blocked => BlockedReason::MAX_STATE,
            Self::Failed => FailedReason::MAX_VALUE,
        }
    }
}

/// Ordered reason symbols attached to a job event.
/// 附加於作業事件、依序排列的原因代碼。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ReasonSet {
    symbols: Vec<&'static str>,
}

impl ReasonSet {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            symbols: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|value| *value == symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.symbols.iter().copied()
    }

    pub fn as_slice(&self) -> &[&'static str] {
        &self.symbols
    }

    /// Symbols joined with `|`, the form used in completion reports.
    pub fn joined(&self) -> String {
        self.symbols.join("|")
    }
}

impl fmt::Display for ReasonSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}

/// Number of set bits strictly below `bound`.
pub fn count_reason_bits(bits: u64, bound: u32) -> usize {
    let bound = bound.min(u64::BITS);
    let window = if bound == u64::BITS {
        u64::MAX
    } else {
        (1u64 << bound) - 1
    };
    (bits & window).count_ones() as usize
}

/// Decodes `bits` through `table`, inspecting bit indices `0..bound`.
///
/// For each set bit the table is walked top to bottom against the bits not
/// yet consumed and the first intersecting entry is emitted; the bit is then
/// cleared whether or not anything matched. At most `expected` symbols are
/// kept.
pub fn decode_reasons(bits: u64, bound: u32, table: &[ReasonEntry], expected: usize) -> ReasonSet {
    let mut remaining = bits;
    let mut reasons = ReasonSet::with_capacity(expected);

    for index in 0..bound.min(u64::BITS) {
        let bit = 1u64 << index;
        if bits & bit == 0 {
            continue;
        }
        let matched = table.iter().find(|entry| remaining & entry.mask != 0);
        remaining &= !bit;
        if let Some(entry) = matched {
            if reasons.len() < expected {
                reasons.symbols.push(entry.symbol);
            }
        }
    }
    reasons
}

/// Decodes `bits` with the table and bound of `kind`.
pub fn decode_kind(bits: u64, kind: ReasonKind) -> ReasonSet {
    let bound = kind.bound();
    let expected = count_reason_bits(bits, bound);
    if expected == 0 {
        return ReasonSet::default();
    }
    decode_reasons(bits, bound, kind.table(), expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &[ReasonEntry] = &[ReasonEntry::new(2, "A"), ReasonEntry::new(5, "B")];

    #[test]
    fn set_bits_decode_in_bit_order() {
        let bits = (1 << 2) | (1 << 5);
        let reasons = decode_reasons(bits, 8, SAMPLE, 2);
        assert_eq!(reasons.as_slice(), &["A", "B"]);
    }

    #[test]
    fn bits_beyond_bound_are_ignored() {
        let bits = (1 << 2) | (1 << 5);
        let reasons = decode_reasons(bits, 4, SAMPLE, 1);
        assert_eq!(reasons.as_slice(), &["A"]);
    }

    #[test]
    fn unmapped_bit_contributes_nothing() {
        let bits = (1 << 2) | (1 << 6);
        let reasons = decode_reasons(bits, 8, SAMPLE, 2);
        assert_eq!(reasons.as_slice(), &["A"]);
    }

    #[test]
    fn table_order_decides_symbol() {
        // An unmapped low bit is answered by the first entry that still
        // matches pending bits.
        let bits = (1 << 0) | (1 << 5);
        let reasons = decode_reasons(bits, 8, SAMPLE, 2);
        assert_eq!(reasons.as_slice(), &["B", "B"]);

        let reversed = &[ReasonEntry::new(5, "B"), ReasonEntry::new(2, "A")];
        let reasons = decode_reasons((1 << 2) | (1 << 5), 8, reversed, 2);
        assert_eq!(reasons.as_slice(), &["B", "B"]);
    }

    #[test]
    fn output_capped_at_expected_count() {
        let bits = (1 << 2) | (1 << 5);
        let reasons = decode_reasons(bits, 8, SAMPLE, 1);
        assert_eq!(reasons.len(), 1);
    }

    #[test]
    fn count_respects_bound() {
        let bits = u64::MAX;
        assert_eq!(count_reason_bits(bits, 3), 3);
        assert_eq!(count_reason_bits(bits, 64), 64);
        assert_eq!(count_reason_bits(bits, 80), 64);
        assert_eq!(count_reason_bits(0, 64), 0);
    }

    #[test]
    fn tables_follow_bit_order() {
        for (index, entry) in BLOCKED_REASON_TABLE.iter().enumerate() {
            assert_eq!(entry.mask, 1 << index);
        }
        for (index, entry) in FAILED_REASON_TABLE.iter().enumerate() {
            assert_eq!(entry.mask, 1 << index);
        }
        assert_eq!(BlockedReason::MAX_STATE as usize, BlockedReason::ALL.len());
        assert_eq!(FailedReason::MAX_VALUE as usize, FailedReason::ALL.len());
    }

    #[test]
    fn blocked_and_failed_tables_differ() {
        let bits = BlockedReason::Jammed.mask() | BlockedReason::OutOfPaper.mask();
        let blocked = decode_kind(bits, ReasonKind::Blocked);
        assert_eq!(blocked.as_slice(), &["input-media-supply-empty", "jam"]);
        assert_eq!(blocked.joined(), "input-media-supply-empty|jam");

        let failed = decode_kind(FailedReason::UnsupportedDocumentFormat.mask(), ReasonKind::Failed);
        assert_eq!(failed.as_slice(), &["unsupported-document-format"]);
        assert_eq!(FailedReason::AccountLimitReached.symbol(), "job-account-limit-reached");
    }
}
