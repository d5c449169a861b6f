//! CAGD geometry: NURBS evaluation, curves with arc-length sampling, surfaces
//! and tessellation.

pub mod curve;
pub mod nurbs;
pub mod surface;
pub mod tessellate;

pub use curve::{Curve, FrenetFrames, Line, NurbsCurve};
pub use surface::{NurbsSurface, Surface};
pub use tessellate::{curve_polyline, surface_grid, SurfaceMesh};
