//! Kernel operation result codes and their user-facing messages.
//!
//! Codes are numbered in kernel declaration order starting at `Success = 0`.
//! Anything the table does not know maps to [`GENERIC_FAILURE`].

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Message for codes with no dedicated entry.
pub const GENERIC_FAILURE: &str = "The operation cannot be done. ";

/// A kernel operation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u32)]
pub enum ResultCode {
    Success = 0,
    Empty,
    TooManyAxes,
    TooFewAxes,
    TooManyContours,
    Stars,
    SelfIntersection,
    Intersection,
    NoIntersectSolid,
    NoIntersectSection,
    MustBeClosed,
    MustBeOpen,
    AxisIntersection,
    InvalidType,
    NoSequenceCurveAndSections,
    MultiSolid,
    CurveError,
    ContourError,
    SurfaceError,
    SolidError,
    ParameterError,
    ThicknessError,
    SelfIntersect,
    SelfIntWhenExtended,
    Intersect,
    NoIntersect,
    OffsetIntersectError,
    BooleanError,
    NoEdges,
    PrepareError,
    ChamferError,
    FilletError,
    ChamferSurfaceError,
    FilletSurfaceError,
    TooLargeChamfer,
    TooLargeFillet,
    SemiChamfer,
    SemiFillet,
    CuttingError,
    ThinError,
    RibError,
    DraftError,
    CutBySilhouetteError,
    SplitWireNotIntersectFace,
    SplitWireNotSplitFace,
    NotAllContoursUsed,
    Error,
}

impl ResultCode {
    pub fn from_raw(code: u32) -> Option<Self> {
        Self::try_from(code).ok()
    }

    pub fn code(self) -> u32 {
        self.into()
    }

    pub fn message(self) -> &'static str {
        use ResultCode::*;
        match self {
            Success => "Success. ",
            Empty => "Empty sketch. ",
            TooManyAxes => "Too many axes. ",
            TooFewAxes => "There should be exactly one axis. ",
            TooManyContours => "There should be exactly one contour. ",
            Stars => "Contours should not intersect each other and/or have common points. ",
            SelfIntersection => "Contour self-intersection. ",
            Intersection => "Contours intersection. ",
            NoIntersectSolid => "There is no intersection of generating contour with the solid",
            NoIntersectSection => "Axial line does not intersect sections",
            MustBeClosed => "All the contours should be closed.",
            MustBeOpen => "All the contours should be open. ",
            AxisIntersection => "The axis intersects the contour. ",
            InvalidType => "The curve type does not suit for the this operation",
            NoSequenceCurveAndSections => "Nonsequential arrangement of sections along the curve.",
            MultiSolid => "The solid consists of separate parts. ",
            CurveError => "Invalid curve. ",
            ContourError => "Invalid contour. ",
            SurfaceError => "Invalid surface. ",
            SolidError => "Invalid solid. ",
            ParameterError => "Invalid parameter. ",
            ThicknessError => "Incorrectly specified thickness.",
            SelfIntersect => "The object has self-intersections. ",
            SelfIntWhenExtended => "The object has self-intersections on the extension.",
            Intersect => "The objects have intersections.",
            NoIntersect => "The objects have no intersections.",
            OffsetIntersectError => "Objects intersection error.",
            BooleanError => "Error in the Boolean operation.",
            NoEdges => "Edges not found. ",
            PrepareError => "Error while preparing the operation. ",
            ChamferError => "Error while creation an edge chamfer. ",
            FilletError => "Error while filleting an edge. ",
            ChamferSurfaceError => "Error while creation an edge chamfer surface. ",
            FilletSurfaceError => "Error while creating an edge fillet surface. ",
            TooLargeChamfer => "Too large cathetus of a chamfer. ",
            TooLargeFillet => "Too large fillet radius. ",
            SemiChamfer => "Chamfers created not for all edges. ",
            SemiFillet => "Not all the edges are filleted. ",
            CuttingError => "Error of cutting by surface. ",
            ThinError => "Error of a thin-walled solid creation. ",
            RibError => "Error of a rib construction. ",
            DraftError => "Error of solid's faces drafting ",
            CutBySilhouetteError => "Error of cutting by silhouette curve. ",
            SplitWireNotIntersectFace => "Parting line does not split faces",
            SplitWireNotSplitFace => "Parting line does not intersect faces",
            NotAllContoursUsed => "Not all objects were used.",
            Error => GENERIC_FAILURE,
        }
    }

    /// Message for a raw code, falling back to the generic failure text.
    pub fn message_for(code: u32) -> &'static str {
        Self::from_raw(code).map_or(GENERIC_FAILURE, Self::message)
    }
}
