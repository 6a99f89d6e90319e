//! Per-segment intersection status.
//!
//! Each kind of conflict has at most one live record. Updating a kind drops
//! the previous record before storing the new one; contacts with other
//! segments and somata accumulate inside the single record of their kind.

use crate::graph::{EdgeId, VertexId};

/// Regularity conflict: the envelope is undefined near `t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegIsecInfo {
    /// Local parameter of the minimum.
    pub t: f64,
    /// Value of `|γ'|² − r'²` there.
    pub value: f64,
}

/// Local self-intersection: curvature radius below tube radius near `t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LsiIsecInfo {
    /// Local parameter of the minimum.
    pub t: f64,
    /// Value of the curvature polynomial there.
    pub value: f64,
}

/// Contact with another segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentContact {
    /// Other segment.
    pub partner: EdgeId,
    /// Parameter on this segment.
    pub s: f64,
    /// Parameter on the partner.
    pub t: f64,
}

impl SegmentContact {
    /// The same contact seen from the partner.
    pub fn mirrored(&self, this: EdgeId) -> Self {
        Self {
            partner: this,
            s: self.t,
            t: self.s,
        }
    }
}

/// Global self-intersection: overlaps with non-adjacent segments of the same path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GsiIsecInfo {
    /// Overlapping segments.
    pub contacts: Vec<SegmentContact>,
}

/// Relation between two segments of different paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NsnsRelation {
    /// Child path segment against the parent segments at its branch vertex.
    RelatedNeighbour,
    /// Any other pair.
    Independent,
}

/// Contact with a segment of another path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NsnsContact {
    /// Location.
    pub contact: SegmentContact,
    /// How the two segments are related.
    pub relation: NsnsRelation,
}

/// Neurite segment vs neurite segment conflicts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NsnsIsecInfo {
    /// Illegal contacts.
    pub contacts: Vec<NsnsContact>,
    /// The first segment of a child path does not leave its parent tube.
    pub required_contact_broken: bool,
}

/// Contact with a soma sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SomaContact {
    /// Soma vertex.
    pub soma: VertexId,
    /// Parameter of the deepest point on the segment.
    pub t: f64,
    /// Value of `|γ − c|² − (R + r)²` there.
    pub value: f64,
}

/// Soma vs neurite segment conflicts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SonsIsecInfo {
    /// Illegal contacts.
    pub contacts: Vec<SomaContact>,
    /// A root segment does not start inside its soma or does not leave it.
    pub required_contact_broken: bool,
}

/// Summary flags. `clean` is set only when nothing else is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusFlags {
    /// No conflict and no anomaly.
    pub clean: bool,
    /// Path minimal distance violation.
    pub pmdv: bool,
    /// Soma-path minimal distance violation.
    pub spmdv: bool,
    /// Segment minimal distance violation.
    pub smdv: bool,
    /// Regularity violated.
    pub reg: bool,
    /// Local self-intersection.
    pub lsi: bool,
    /// Global self-intersection.
    pub gsi: bool,
    /// Required soma contact broken.
    pub rc_sons: bool,
    /// Illegal soma contact.
    pub ic_sons: bool,
    /// Required neurite contact broken.
    pub rc_nsns: bool,
    /// Illegal contact between related neighbours.
    pub icrn_nsns: bool,
    /// Illegal contact between independent segments.
    pub icin_nsns: bool,
}

impl StatusFlags {
    fn any_conflict(&self) -> bool {
        self.pmdv
            || self.spmdv
            || self.smdv
            || self.reg
            || self.lsi
            || self.gsi
            || self.rc_sons
            || self.ic_sons
            || self.rc_nsns
            || self.icrn_nsns
            || self.icin_nsns
    }
}

/// Analysis result of one segment.
///
/// # Example
///
/// ```rust
/// use cellgen_network::analysis::status::{IntersectionStatus, RegIsecInfo};
///
/// let mut status = IntersectionStatus::default();
/// status.update_reg(Some(RegIsecInfo { t: 0.5, value: -1.0 }));
/// assert!(status.flags().reg);
/// assert!(!status.is_clean());
/// status.reset();
/// assert!(status.reg().is_none());
/// assert!(status.is_clean());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionStatus {
    reg: Option<RegIsecInfo>,
    lsi: Option<LsiIsecInfo>,
    gsi: Option<GsiIsecInfo>,
    nsns: Option<NsnsIsecInfo>,
    sons: Option<SonsIsecInfo>,
    flags: StatusFlags,
    anomalies: u32,
}

impl Default for IntersectionStatus {
    fn default() -> Self {
        Self {
            reg: None,
            lsi: None,
            gsi: None,
            nsns: None,
            sons: None,
            flags: StatusFlags {
                clean: true,
                ..StatusFlags::default()
            },
            anomalies: 0,
        }
    }
}

impl IntersectionStatus {
    /// Clears every record, flag and anomaly.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Regularity record.
    pub fn reg(&self) -> Option<&RegIsecInfo> {
        self.reg.as_ref()
    }

    /// Local self-intersection record.
    pub fn lsi(&self) -> Option<&LsiIsecInfo> {
        self.lsi.as_ref()
    }

    /// Global self-intersection record.
    pub fn gsi(&self) -> Option<&GsiIsecInfo> {
        self.gsi.as_ref()
    }

    /// Neurite contact record.
    pub fn nsns(&self) -> Option<&NsnsIsecInfo> {
        self.nsns.as_ref()
    }

    /// Soma contact record.
    pub fn sons(&self) -> Option<&SonsIsecInfo> {
        self.sons.as_ref()
    }

    /// Current flags.
    pub fn flags(&self) -> StatusFlags {
        self.flags
    }

    /// Solver anomalies recorded on this segment.
    pub fn anomalies(&self) -> u32 {
        self.anomalies
    }

    /// Returns true if no conflict and no anomaly is recorded.
    pub fn is_clean(&self) -> bool {
        self.flags.clean
    }

    /// Replaces or clears the regularity record.
    pub fn update_reg(&mut self, info: Option<RegIsecInfo>) {
        self.flags.reg = info.is_some();
        self.reg = info;
        self.refresh();
    }

    /// Replaces or clears the local self-intersection record.
    pub fn update_lsi(&mut self, info: Option<LsiIsecInfo>) {
        self.flags.lsi = info.is_some();
        self.lsi = info;
        self.refresh();
    }

    /// Replaces or clears the global self-intersection record.
    pub fn update_gsi(&mut self, info: Option<GsiIsecInfo>) {
        self.flags.gsi = info.as_ref().is_some_and(|i| !i.contacts.is_empty());
        self.gsi = info;
        self.refresh();
    }

    /// Adds an overlap with a non-adjacent segment of the same path.
    pub fn add_gsi_contact(&mut self, contact: SegmentContact) {
        self.gsi.get_or_insert_with(GsiIsecInfo::default).contacts.push(contact);
        self.flags.gsi = true;
        self.refresh();
    }

    /// Adds an illegal contact with a segment of another path.
    pub fn add_nsns_contact(&mut self, contact: NsnsContact) {
        match contact.relation {
            NsnsRelation::RelatedNeighbour => self.flags.icrn_nsns = true,
            NsnsRelation::Independent => self.flags.icin_nsns = true,
        }
        self.nsns.get_or_insert_with(NsnsIsecInfo::default).contacts.push(contact);
        self.refresh();
    }

    /// Marks the required contact with the parent path as broken.
    pub fn set_rc_nsns(&mut self) {
        self.nsns.get_or_insert_with(NsnsIsecInfo::default).required_contact_broken = true;
        self.flags.rc_nsns = true;
        self.refresh();
    }

    /// Adds an illegal contact with a soma.
    pub fn add_sons_contact(&mut self, contact: SomaContact) {
        self.sons.get_or_insert_with(SonsIsecInfo::default).contacts.push(contact);
        self.flags.ic_sons = true;
        self.refresh();
    }

    /// Marks the required contact with the own soma as broken.
    pub fn set_rc_sons(&mut self) {
        self.sons.get_or_insert_with(SonsIsecInfo::default).required_contact_broken = true;
        self.flags.rc_sons = true;
        self.refresh();
    }

    /// Sets the distance violation flags.
    pub fn set_distance_violations(&mut self, smdv: bool, pmdv: bool, spmdv: bool) {
        self.flags.smdv = smdv;
        self.flags.pmdv = pmdv;
        self.flags.spmdv = spmdv;
        self.refresh();
    }

    /// Counts one solver failure.
    pub fn record_anomaly(&mut self) {
        self.anomalies += 1;
        self.refresh();
    }

    fn refresh(&mut self) {
        self.flags.clean = !self.flags.any_conflict() && self.anomalies == 0;
    }
}
