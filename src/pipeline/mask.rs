use crate::error::PipelineError;

/// A point in grid-coordinate space (x right, y down, origin top-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPoint {
    pub x: f32,
    pub y: f32,
}

impl GridPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Four ordered corners and the four boundary segments derived from them:
/// (P1,P2), (P2,P4), (P3,P4), (P1,P3).
///
/// Corners are supplied as top-left, top-right, bottom-left, bottom-right.
/// Containment is a fixed-pattern half-plane intersection, not a general
/// point-in-polygon test, so construction validates that the corners form a
/// convex quadrilateral wound to match the pattern.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryQuad {
    p1: GridPoint,
    p2: GridPoint,
    p3: GridPoint,
    p4: GridPoint,
}

// Signed side of (x, y) relative to the directed segment a -> b. Positive on
// one side, negative on the other, zero on the line.
fn side(a: GridPoint, b: GridPoint, x: f32, y: f32) -> f32 {
    (b.x - a.x) * (y - a.y) - (b.y - a.y) * (x - a.x)
}

fn turn(a: GridPoint, b: GridPoint, c: GridPoint) -> f32 {
    side(a, b, c.x, c.y)
}

impl BoundaryQuad {
    pub fn new(
        p1: GridPoint,
        p2: GridPoint,
        p3: GridPoint,
        p4: GridPoint,
    ) -> Result<Self, PipelineError> {
        // Perimeter order is P1 -> P2 -> P4 -> P3. Every consecutive turn
        // must bend the same way or the half-plane pattern breaks down.
        let turns = [
            turn(p1, p2, p4),
            turn(p2, p4, p3),
            turn(p4, p3, p1),
            turn(p3, p1, p2),
        ];
        if turns.iter().any(|t| *t == 0.0) {
            return Err(PipelineError::InvalidBoundary(
                "degenerate corners (collinear or coincident)",
            ));
        }
        if turns.iter().any(|t| *t < 0.0) {
            if turns.iter().all(|t| *t < 0.0) {
                return Err(PipelineError::InvalidBoundary(
                    "corners must be ordered top-left, top-right, bottom-left, bottom-right",
                ));
            }
            return Err(PipelineError::InvalidBoundary(
                "corners describe a self-intersecting quadrilateral",
            ));
        }
        Ok(Self { p1, p2, p3, p4 })
    }

    /// Half-plane test against the four segments: non-negative side of
    /// (P1,P2) and (P2,P4), non-positive side of (P3,P4) and (P1,P3).
    /// Points exactly on a segment count as inside.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        side(self.p1, self.p2, x, y) >= 0.0
            && side(self.p2, self.p4, x, y) >= 0.0
            && side(self.p3, self.p4, x, y) <= 0.0
            && side(self.p1, self.p3, x, y) <= 0.0
    }

    pub fn corners(&self) -> [GridPoint; 4] {
        [self.p1, self.p2, self.p3, self.p4]
    }

    pub fn centroid(&self) -> GridPoint {
        GridPoint::new(
            (self.p1.x + self.p2.x + self.p3.x + self.p4.x) / 4.0,
            (self.p1.y + self.p2.y + self.p3.y + self.p4.y) / 4.0,
        )
    }
}

/// Region-of-interest mask over the depth grid. Disabled until a valid
/// boundary is defined; a rejected boundary leaves it disabled.
#[derive(Debug, Default)]
pub struct GeometryMask {
    boundary: Option<BoundaryQuad>,
}

impl GeometryMask {
    pub fn new() -> Self {
        Self { boundary: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.boundary.is_some()
    }

    pub fn boundary(&self) -> Option<&BoundaryQuad> {
        self.boundary.as_ref()
    }

    /// Stores the boundary and enables masking. Malformed corners are
    /// surfaced to the configuration layer and disable masking entirely
    /// rather than producing a silently wrong mask.
    pub fn set_boundary(
        &mut self,
        p1: GridPoint,
        p2: GridPoint,
        p3: GridPoint,
        p4: GridPoint,
    ) -> Result<(), PipelineError> {
        match BoundaryQuad::new(p1, p2, p3, p4) {
            Ok(quad) => {
                self.boundary = Some(quad);
                Ok(())
            }
            Err(e) => {
                self.boundary = None;
                Err(e)
            }
        }
    }

    pub fn clear_boundary(&mut self) {
        self.boundary = None;
    }

    /// Pure read; `false` whenever masking is disabled.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        match &self.boundary {
            Some(quad) => quad.contains(x, y),
            None => false,
        }
    }
}
