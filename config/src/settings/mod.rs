//! Typed settings records consumed by the geometry core.
//!
//! The settings are validated once, before any geometry work starts, and are
//! then passed by reference into the analysis, meshing and post-processing
//! stages. Post-processing parameter records can only be created through
//! their validating constructors so that, for instance, HC smoothing with
//! `beta <= alpha` can never reach the smoothing loop.

use std::fmt;
use std::str::FromStr;

use crate::constants::*;

// =============================================================================
// STRATEGIES
// =============================================================================

/// Candidate filter shared by the angle and depth based partition strategies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartitionFilter {
    /// Maximum turning angle in radians, from `[0, π]`.
    pub filter_angle: f64,
    /// Maximum ratio of the larger to the smaller adjacent radius, `>= 1`.
    pub filter_radius_ratio: f64,
}

impl PartitionFilter {
    /// Creates a filter from an angle given in degrees.
    ///
    /// # Examples
    /// ```
    /// use config::settings::PartitionFilter;
    /// let filter = PartitionFilter::from_degrees(90.0, 10.0).unwrap();
    /// assert!((filter.filter_angle - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    /// assert!(PartitionFilter::from_degrees(190.0, 10.0).is_err());
    /// ```
    pub fn from_degrees(angle_deg: f64, filter_radius_ratio: f64) -> Result<Self, ConfigError> {
        let filter = Self {
            filter_angle: angle_deg.to_radians(),
            filter_radius_ratio,
        };
        filter.validate()?;
        Ok(filter)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=std::f64::consts::PI).contains(&self.filter_angle) {
            return Err(ConfigError::out_of_range(
                "filter_angle",
                self.filter_angle.to_degrees(),
                "[0, 180] degrees",
            ));
        }
        if !(self.filter_radius_ratio >= 1.0) {
            return Err(ConfigError::out_of_range(
                "filter_radius_ratio",
                self.filter_radius_ratio,
                "[1.0, oo)",
            ));
        }
        Ok(())
    }
}

impl Default for PartitionFilter {
    fn default() -> Self {
        Self {
            filter_angle: DEFAULT_FILTER_ANGLE,
            filter_radius_ratio: DEFAULT_FILTER_RADIUS_RATIO,
        }
    }
}

/// Rule deciding how neurite paths are continued at a vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PartitionStrategy {
    /// Paths always end at the next branching vertex.
    SimpleNeuritePaths,
    /// Continue into the filtered child of minimum turning angle.
    MinAngle(PartitionFilter),
    /// Continue into the filtered child rooting the deepest sub-tree.
    MaxChordalDepth(PartitionFilter),
}

impl PartitionStrategy {
    /// Builds a strategy from its command line name and filter arguments.
    ///
    /// # Examples
    /// ```
    /// use config::settings::PartitionStrategy;
    /// let s = PartitionStrategy::from_parts("min-angle", 45.0, 2.0).unwrap();
    /// assert_eq!(s.name(), "min-angle");
    /// assert!(PartitionStrategy::from_parts("longest", 45.0, 2.0).is_err());
    /// ```
    pub fn from_parts(name: &str, angle_deg: f64, filter_radius_ratio: f64) -> Result<Self, ConfigError> {
        let filter = PartitionFilter::from_degrees(angle_deg, filter_radius_ratio)?;
        match name {
            "max-chordal-depth" => Ok(Self::MaxChordalDepth(filter)),
            "min-angle" => Ok(Self::MinAngle(filter)),
            "simple-neurite-paths" => Ok(Self::SimpleNeuritePaths),
            other => Err(ConfigError::UnknownStrategy(other.to_string())),
        }
    }

    /// Command line name of the strategy.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SimpleNeuritePaths => "simple-neurite-paths",
            Self::MinAngle(_) => "min-angle",
            Self::MaxChordalDepth(_) => "max-chordal-depth",
        }
    }

    /// Candidate filter, if the strategy applies one.
    pub fn filter(&self) -> Option<PartitionFilter> {
        match self {
            Self::SimpleNeuritePaths => None,
            Self::MinAngle(filter) | Self::MaxChordalDepth(filter) => Some(*filter),
        }
    }
}

impl Default for PartitionStrategy {
    fn default() -> Self {
        Self::MaxChordalDepth(PartitionFilter::default())
    }
}

/// Scheme assigning parameters to the vertices of a neurite path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParametrizationStrategy {
    /// Increments equal the Euclidean vertex distance.
    #[default]
    ChordLength,
    /// Parameters equally spaced in `[0, 1]`.
    Uniform,
    /// Increments equal the square root of the vertex distance.
    Centripetal,
}

impl FromStr for ParametrizationStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chord-length" => Ok(Self::ChordLength),
            "uniform" => Ok(Self::Uniform),
            "centripetal" => Ok(Self::Centripetal),
            other => Err(ConfigError::UnknownStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for ParametrizationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ChordLength => "chord-length",
            Self::Uniform => "uniform",
            Self::Centripetal => "centripetal",
        })
    }
}

// =============================================================================
// STAGE SETTINGS
// =============================================================================

/// Settings of the geometric analysis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisSettings {
    /// Worker thread count, `>= 1`.
    pub nthreads: usize,
    /// Univariate solver tolerance, from `[1e-11, 1e-3]`.
    pub univar_eps: f64,
    /// Bivariate solver tolerance, from `[1e-11, 1e-3]`.
    pub bivar_eps: f64,
}

impl AnalysisSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.nthreads == 0 {
            return Err(ConfigError::out_of_range("ana-nthreads", self.nthreads, ">= 1"));
        }
        let eps_range = SOLVER_EPS_MIN..=SOLVER_EPS_MAX;
        if !eps_range.contains(&self.univar_eps) {
            return Err(ConfigError::out_of_range("ana-univar-eps", self.univar_eps, "[1e-11, 1e-3]"));
        }
        if !eps_range.contains(&self.bivar_eps) {
            return Err(ConfigError::out_of_range("ana-bivar-eps", self.bivar_eps, "[1e-11, 1e-3]"));
        }
        Ok(())
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            nthreads: DEFAULT_ANA_NTHREADS,
            univar_eps: DEFAULT_UNIVAR_EPS,
            bivar_eps: DEFAULT_BIVAR_EPS,
        }
    }
}

/// Parameters of the preliminary cell network preconditioning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreconditionSettings {
    /// Minimum segment length in units of the larger end radius.
    pub alpha: f64,
    /// Maximum radius ratio across one segment.
    pub beta: f64,
    /// Maximum segment length in units of the smaller end radius.
    pub gamma: f64,
}

impl PreconditionSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("cellnet-pc alpha", self.alpha), ("cellnet-pc beta", self.beta), ("cellnet-pc gamma", self.gamma)] {
            if !(value > 0.0) {
                return Err(ConfigError::out_of_range(name, value, "]0, oo("));
            }
        }
        Ok(())
    }
}

impl Default for PreconditionSettings {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_PC_ALPHA,
            beta: DEFAULT_PC_BETA,
            gamma: DEFAULT_PC_GAMMA,
        }
    }
}

/// Settings of the inductive meshing stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshingSettings {
    /// Icosahedron refinements of soma spheres, from `[0, 10]`.
    pub soma_refinements: u32,
    /// Ring polygon corners of canal surfaces, from `[3, 64]`.
    pub angular_segments: u32,
    /// Multiplier of the optimal triangle height, `> 0`.
    pub triangle_height_factor: f64,
    /// Outer loop iteration cap, `> 0`.
    pub outer_loop_maxiter: u32,
    /// Inner loop iteration cap, `> 0`.
    pub inner_loop_maxiter: u32,
    /// Align consecutive rings instead of offsetting them by half a segment.
    pub preserve_crease_edges: bool,
    /// Face count triggering a flush, `None` keeps the whole mesh resident.
    pub flush_face_limit: Option<usize>,
    /// Radius factor of the first outer loop attempt.
    pub initial_radius_factor: f64,
    /// Decrement of the radius factor after a failed attempt, from `]0, 0.1]`.
    pub radius_factor_decrement: f64,
    /// Complex edge budget multiplier, `> 0`.
    pub complex_edge_max_growth_factor: f64,
}

impl MeshingSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.soma_refinements > MAX_SOMA_REFINEMENTS {
            return Err(ConfigError::out_of_range("meshing-soma-refs", self.soma_refinements, "[0, 10]"));
        }
        if !(MIN_ANGULAR_SEGMENTS..=MAX_ANGULAR_SEGMENTS).contains(&self.angular_segments) {
            return Err(ConfigError::out_of_range(
                "meshing-cansurf-angularsegments",
                self.angular_segments,
                "[3, 64]",
            ));
        }
        if !(self.triangle_height_factor > 0.0) {
            return Err(ConfigError::out_of_range("meshing-triangle-height", self.triangle_height_factor, "> 0"));
        }
        if self.outer_loop_maxiter == 0 {
            return Err(ConfigError::out_of_range("meshing-outerloop-maxiter", 0, "> 0"));
        }
        if self.inner_loop_maxiter == 0 {
            return Err(ConfigError::out_of_range("meshing-innerloop-maxiter", 0, "> 0"));
        }
        if let Some(limit) = self.flush_face_limit {
            if limit < MIN_FLUSH_FACE_LIMIT {
                return Err(ConfigError::out_of_range("meshing-flush", limit, "[1024, oo)"));
            }
        }
        if !(self.initial_radius_factor > RADIUS_FACTOR_FLOOR && self.initial_radius_factor <= 1.0) {
            return Err(ConfigError::out_of_range(
                "meshing-merging-initial-radiusfactor",
                self.initial_radius_factor,
                "]0.5, 1.0]",
            ));
        }
        if !(self.radius_factor_decrement > 0.0 && self.radius_factor_decrement <= MAX_RADIUS_FACTOR_DECREMENT) {
            return Err(ConfigError::out_of_range(
                "meshing-merging-radiusfactor-decrement",
                self.radius_factor_decrement,
                "]0.0, 0.1]",
            ));
        }
        if !(self.complex_edge_max_growth_factor > 0.0) {
            return Err(ConfigError::out_of_range(
                "meshing-complexedge-max-growthfactor",
                self.complex_edge_max_growth_factor,
                "> 0.0",
            ));
        }
        Ok(())
    }
}

impl Default for MeshingSettings {
    fn default() -> Self {
        Self {
            soma_refinements: DEFAULT_SOMA_REFINEMENTS,
            angular_segments: DEFAULT_ANGULAR_SEGMENTS,
            triangle_height_factor: DEFAULT_TRIANGLE_HEIGHT_FACTOR,
            outer_loop_maxiter: DEFAULT_OUTER_LOOP_MAXITER,
            inner_loop_maxiter: DEFAULT_INNER_LOOP_MAXITER,
            preserve_crease_edges: false,
            flush_face_limit: Some(DEFAULT_FLUSH_FACE_LIMIT),
            initial_radius_factor: DEFAULT_INITIAL_RADIUS_FACTOR,
            radius_factor_decrement: DEFAULT_RADIUS_FACTOR_DECREMENT,
            complex_edge_max_growth_factor: DEFAULT_COMPLEX_EDGE_MAX_GROWTH_FACTOR,
        }
    }
}

/// Parameters of the greedy edge collapse post-processing stage.
///
/// # Examples
/// ```
/// use config::settings::GecParams;
/// let gec = GecParams::new(1.5, 0.125, 0.5, 5).unwrap();
/// assert_eq!(gec.depth(), 5);
/// assert!(GecParams::new(0.9, 0.125, 0.5, 5).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GecParams {
    alpha: f64,
    lambda: f64,
    mu: f64,
    depth: u32,
}

impl GecParams {
    /// Validates and creates the parameter record.
    pub fn new(alpha: f64, lambda: f64, mu: f64, depth: u32) -> Result<Self, ConfigError> {
        if !(alpha >= 1.0) {
            return Err(ConfigError::out_of_range("mesh-pp-gec alpha", alpha, "[1.0, oo("));
        }
        if !(lambda > 0.0) {
            return Err(ConfigError::out_of_range("mesh-pp-gec lambda", lambda, "]0.0, oo("));
        }
        if !(mu > 0.0) {
            return Err(ConfigError::out_of_range("mesh-pp-gec mu", mu, "]0.0, oo("));
        }
        if depth <= 1 {
            return Err(ConfigError::out_of_range("mesh-pp-gec d", depth, "> 1"));
        }
        Ok(Self { alpha, lambda, mu, depth })
    }

    /// Triangle aspect ratio threshold.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Relative area below which a face is considered degenerate.
    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Maximum relative area change caused by one collapse.
    pub fn mu(&self) -> f64 {
        self.mu
    }

    /// Face neighbourhood search depth.
    pub fn depth(&self) -> u32 {
        self.depth
    }
}

impl Default for GecParams {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_GEC_ALPHA,
            lambda: DEFAULT_GEC_LAMBDA,
            mu: DEFAULT_GEC_MU,
            depth: DEFAULT_GEC_DEPTH,
        }
    }
}

/// Parameters of HC Laplacian smoothing.
///
/// # Examples
/// ```
/// use config::settings::HcParams;
/// assert!(HcParams::new(0.4, 0.7, 10).is_ok());
/// assert!(HcParams::new(0.7, 0.7, 10).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HcParams {
    alpha: f64,
    beta: f64,
    maxiter: u32,
}

impl HcParams {
    /// Validates and creates the parameter record; `beta` must exceed `alpha`.
    pub fn new(alpha: f64, beta: f64, maxiter: u32) -> Result<Self, ConfigError> {
        if !(alpha >= 0.0) {
            return Err(ConfigError::out_of_range("mesh-pp-hc alpha", alpha, ">= 0"));
        }
        if !(beta > alpha) {
            return Err(ConfigError::HcBetaNotGreaterThanAlpha { alpha, beta });
        }
        if maxiter == 0 {
            return Err(ConfigError::out_of_range("mesh-pp-hc maxiter", maxiter, "> 0"));
        }
        Ok(Self { alpha, beta, maxiter })
    }

    /// Weight of the original position.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Weight of the correction of the vertex itself.
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Number of smoothing passes.
    pub fn maxiter(&self) -> u32 {
        self.maxiter
    }
}

impl Default for HcParams {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_HC_ALPHA,
            beta: DEFAULT_HC_BETA,
            maxiter: DEFAULT_HC_MAXITER,
        }
    }
}

// =============================================================================
// TOP-LEVEL CONFIGURATION
// =============================================================================

/// Complete configuration of one cellgen run.
#[derive(Debug, Clone, PartialEq)]
pub struct CellgenConfig {
    /// Network name, i.e. the SWC file name without extension.
    pub network_name: String,
    /// Run the geometric analysis (required by every meshing output).
    pub analysis_enabled: bool,
    /// Analysis settings.
    pub analysis: AnalysisSettings,
    /// Partition strategy.
    pub partition: PartitionStrategy,
    /// Parametrization strategy.
    pub parametrization: ParametrizationStrategy,
    /// Preconditioning, `None` when disabled.
    pub precondition: Option<PreconditionSettings>,
    /// Factor applied to all neurite radii after preconditioning, `> 0`.
    pub scale_radius: f64,
    /// Render the consistent union mesh.
    pub meshing_enabled: bool,
    /// Render the union mesh even if the network is not clean.
    pub force_meshing: bool,
    /// Render every modelling surface individually.
    pub individual_surfaces: bool,
    /// Meshing settings.
    pub meshing: MeshingSettings,
    /// Greedy edge collapse stage, `None` when disabled.
    pub gec: Option<GecParams>,
    /// HC smoothing stage, `None` when disabled.
    pub hc: Option<HcParams>,
}

impl CellgenConfig {
    /// Creates the default configuration for a network.
    ///
    /// # Examples
    /// ```
    /// use config::settings::CellgenConfig;
    /// let cfg = CellgenConfig::for_network("ri05.CNG.swc").unwrap();
    /// assert_eq!(cfg.network_name, "ri05.CNG");
    /// ```
    pub fn for_network(input: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            network_name: normalize_network_name(input)?,
            ..Self::default()
        })
    }

    /// Validates every parameter and the mutual exclusion rules.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network_name.is_empty() {
            return Err(ConfigError::InvalidNetworkName(String::new()));
        }
        self.analysis.validate()?;
        if let Some(filter) = self.partition.filter() {
            filter.validate()?;
        }
        if let Some(pc) = &self.precondition {
            pc.validate()?;
        }
        if !(self.scale_radius > 0.0) {
            return Err(ConfigError::out_of_range("scale-radius", self.scale_radius, "> 0"));
        }
        self.meshing.validate()?;
        if let Some(gec) = &self.gec {
            GecParams::new(gec.alpha, gec.lambda, gec.mu, gec.depth)?;
        }
        if let Some(hc) = &self.hc {
            HcParams::new(hc.alpha, hc.beta, hc.maxiter)?;
        }
        if !self.analysis_enabled && (self.force_meshing || self.individual_surfaces) {
            return Err(ConfigError::Conflict("meshing requires the geometric analysis"));
        }
        if self.force_meshing && !self.meshing_enabled {
            return Err(ConfigError::Conflict("force-meshing requires meshing"));
        }
        Ok(())
    }

    /// Output path stem of the union mesh.
    pub fn union_mesh_name(&self) -> String {
        self.network_name.clone()
    }

    /// Output path stem of the individually rendered modelling surfaces.
    pub fn individual_surfaces_name(&self) -> String {
        format!("{}{}", self.network_name, INDIVIDUAL_SURFACES_SUFFIX)
    }

    /// Output path stem of the post-processed mesh.
    pub fn post_processed_name(&self) -> String {
        format!("{}{}", self.network_name, POST_PROCESSED_SUFFIX)
    }
}

impl Default for CellgenConfig {
    fn default() -> Self {
        Self {
            network_name: String::from("network"),
            analysis_enabled: true,
            analysis: AnalysisSettings::default(),
            partition: PartitionStrategy::default(),
            parametrization: ParametrizationStrategy::default(),
            precondition: Some(PreconditionSettings::default()),
            scale_radius: 1.0,
            meshing_enabled: true,
            force_meshing: false,
            individual_surfaces: false,
            meshing: MeshingSettings::default(),
            gec: Some(GecParams::default()),
            hc: Some(HcParams::default()),
        }
    }
}

/// Strips a known extension from the network name.
///
/// `.swc`, `.obj` and `.amv` are removed, `.CNG` is kept, any other
/// extension is rejected.
///
/// # Examples
/// ```
/// use config::settings::normalize_network_name;
/// assert_eq!(normalize_network_name("cells/ri05.CNG.swc").unwrap(), "cells/ri05.CNG");
/// assert_eq!(normalize_network_name("ri05.CNG").unwrap(), "ri05.CNG");
/// assert!(normalize_network_name("ri05.txt").is_err());
/// ```
pub fn normalize_network_name(input: &str) -> Result<String, ConfigError> {
    if input.is_empty() {
        return Err(ConfigError::InvalidNetworkName(String::new()));
    }
    let file_start = input.rfind(['/', '\\']).map_or(0, |i| i + 1);
    let Some(dot) = input[file_start..].rfind('.').map(|i| i + file_start) else {
        return Ok(input.to_string());
    };
    let extension = &input[dot..];
    if STRIPPED_EXTENSIONS.contains(&extension) {
        Ok(input[..dot].to_string())
    } else if extension == KEPT_EXTENSION {
        Ok(input.to_string())
    } else {
        Err(ConfigError::InvalidNetworkName(input.to_string()))
    }
}
