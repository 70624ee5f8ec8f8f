//! Vertical layering of intermingled canopies
//!
//! Each day the set of canopy tops and bases in a zone defines a stack of
//! horizontal layers. Every canopy spreads its leaf area uniformly through its
//! own depth, so a layer holds the share of each canopy that overlaps it.
//!
//! Buffers are owned by the zone and reused between days. They are resized
//! only when the number of layers changes and zeroed otherwise.

use crate::core_types::CanopyDescriptor;
use crate::physics::constants::share;
use tracing::trace;

/// Resize a layer buffer to `n` entries and zero it
#[inline]
fn reset_buffer(buffer: &mut Vec<f64>, n: usize) {
    if buffer.len() != n {
        buffer.resize(n, 0.0);
    }
    buffer.fill(0.0);
}

/// Layer geometry and layer totals of one zone, bottom layer first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerStack {
    /// Layer thickness (m)
    pub delta_z: Vec<f64>,
    /// Leaf-area weighted total extinction coefficient of each layer
    pub layer_ktot: Vec<f64>,
    /// Total (green plus senesced) LAI in each layer
    pub lai_tot_sum: Vec<f64>,
}

impl LayerStack {
    #[inline]
    pub fn num_layers(&self) -> usize {
        self.delta_z.len()
    }

    /// Height of the top of the stack (m)
    pub fn total_height(&self) -> f64 {
        self.delta_z.iter().sum()
    }

    /// Total LAI of the zone summed over layers
    pub fn total_lai(&self) -> f64 {
        self.lai_tot_sum.iter().sum()
    }

    /// Rebuild the stack from ascending layer boundaries
    pub fn rebuild(&mut self, boundaries: &[f64]) {
        let n = boundaries.len().saturating_sub(1);
        reset_buffer(&mut self.delta_z, n);
        reset_buffer(&mut self.layer_ktot, n);
        reset_buffer(&mut self.lai_tot_sum, n);
        for (dz, pair) in self.delta_z.iter_mut().zip(boundaries.windows(2)) {
            *dz = pair[1] - pair[0];
        }
    }
}

/// One canopy in a zone with its per-layer terms
#[derive(Debug, Clone, PartialEq)]
pub struct CanopyState {
    pub descriptor: CanopyDescriptor,
    /// Green-leaf extinction coefficient
    pub k: f64,
    /// Total-leaf extinction coefficient
    pub ktot: f64,
    /// Green LAI in each layer
    pub lai: Vec<f64>,
    /// Total LAI in each layer
    pub lai_tot: Vec<f64>,
    /// Share of the layer's total LAI
    pub ftot: Vec<f64>,
    /// Green LAI over the layer's total LAI
    pub fgreen: Vec<f64>,
    /// Intercepted shortwave (MJ/m²)
    pub rs: Vec<f64>,
    /// Net long wave (MJ/m²)
    pub rl: Vec<f64>,
    /// Soil heat share (MJ/m²)
    pub rsoil: Vec<f64>,
    /// Canopy conductance (m/s)
    pub gc: Vec<f64>,
    /// Aerodynamic conductance (m/s)
    pub ga: Vec<f64>,
    /// Potential evapotranspiration (mm)
    pub pet: Vec<f64>,
    /// Radiation term of the potential evapotranspiration (mm)
    pub petr: Vec<f64>,
    /// Aerodynamic term of the potential evapotranspiration (mm)
    pub peta: Vec<f64>,
    /// Decoupling coefficient
    pub omega: Vec<f64>,
    /// Intercepted rainfall (mm)
    pub interception: Vec<f64>,
}

impl CanopyState {
    pub fn new(descriptor: CanopyDescriptor) -> Self {
        Self {
            descriptor,
            k: 0.0,
            ktot: 0.0,
            lai: Vec::new(),
            lai_tot: Vec::new(),
            ftot: Vec::new(),
            fgreen: Vec::new(),
            rs: Vec::new(),
            rl: Vec::new(),
            rsoil: Vec::new(),
            gc: Vec::new(),
            ga: Vec::new(),
            pet: Vec::new(),
            petr: Vec::new(),
            peta: Vec::new(),
            omega: Vec::new(),
            interception: Vec::new(),
        }
    }

    /// Swap in today's snapshot and zero every layer buffer at `n` layers
    pub fn reset(&mut self, descriptor: CanopyDescriptor, n: usize) {
        self.descriptor = descriptor;
        self.k = 0.0;
        self.ktot = 0.0;
        for buffer in [
            &mut self.lai,
            &mut self.lai_tot,
            &mut self.ftot,
            &mut self.fgreen,
            &mut self.rs,
            &mut self.rl,
            &mut self.rsoil,
            &mut self.gc,
            &mut self.ga,
            &mut self.pet,
            &mut self.petr,
            &mut self.peta,
            &mut self.omega,
            &mut self.interception,
        ] {
            reset_buffer(buffer, n);
        }
    }

    /// Top and base of the canopy in metres, rounded to the layer grid
    pub fn extent(&self) -> (f64, f64) {
        canopy_extent(&self.descriptor)
    }
}

fn canopy_extent(canopy: &CanopyDescriptor) -> (f64, f64) {
    let top = *canopy.height.to_meters_rounded();
    let depth = *canopy.depth.to_meters_rounded();
    (top, top - depth)
}

/// Layer boundaries (m, ascending) for a set of canopies.
///
/// The ground is always the first boundary. Each canopy contributes its top
/// unless it coincides with, or lies within `min_height_diff` of, a boundary
/// already above ground; each canopy base is added unless already present.
///
/// # Arguments
/// * `canopies` - Canopies present today
/// * `min_height_diff` - Minimum separation for a canopy top to open a new layer (m)
///
/// # Returns
/// Sorted boundaries, or none at all when there is no canopy
pub fn layer_boundaries<'a, I>(canopies: I, min_height_diff: f64) -> Vec<f64>
where
    I: IntoIterator<Item = &'a CanopyDescriptor>,
{
    let mut nodes: Vec<f64> = vec![0.0];
    let mut any = false;
    for canopy in canopies {
        any = true;
        let (top, base) = canopy_extent(canopy);
        let near_existing = nodes
            .iter()
            .enumerate()
            .any(|(i, &n)| n == top || (i > 0 && (n - top).abs() < min_height_diff));
        if !near_existing {
            nodes.push(top);
        }
        if !nodes.contains(&base) {
            nodes.push(base);
        }
    }
    if !any {
        return Vec::new();
    }
    nodes.sort_by(f64::total_cmp);
    nodes
}

/// Spread each canopy's leaf area over the layers it occupies.
///
/// Fills `lai`, `lai_tot`, `ftot` and `fgreen` of every canopy and the layer
/// total LAI of the stack. Leaf area density is total LAI over canopy depth,
/// so a canopy of zero depth contributes nothing.
pub fn distribute_leaf_area(stack: &mut LayerStack, canopies: &mut [CanopyState]) {
    let mut top = 0.0;
    for i in 0..stack.num_layers() {
        let bottom = top;
        top += stack.delta_z[i];
        stack.lai_tot_sum[i] = 0.0;

        for canopy in canopies.iter_mut() {
            let (canopy_top, canopy_base) = canopy.extent();
            if canopy_top > bottom && canopy_base < top {
                let d = &canopy.descriptor;
                let density = share(d.lai_total, canopy_top - canopy_base);
                canopy.lai_tot[i] = density * stack.delta_z[i];
                canopy.lai[i] = canopy.lai_tot[i] * share(d.lai, d.lai_total);
                stack.lai_tot_sum[i] += canopy.lai_tot[i];
            }
        }

        for canopy in canopies.iter_mut() {
            canopy.ftot[i] = share(canopy.lai_tot[i], stack.lai_tot_sum[i]);
            canopy.fgreen[i] = share(canopy.lai[i], stack.lai_tot_sum[i]);
        }
        trace!(
            "Layer {}: {:.3}-{:.3} m, total LAI {:.4}",
            i,
            bottom,
            top,
            stack.lai_tot_sum[i]
        );
    }
}
