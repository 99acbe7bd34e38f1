use std::ops::{Div, Mul};

use crate::quantity::area::SquareMetres;

quantity!(Millimetres, suffix: "mm", precision: 1);

quantity!(Litres, suffix: "L", precision: 1);

impl Millimetres {
    /// Drop the fractional millimetres, rounding towards zero.
    pub fn trunc(self) -> Self {
        Self(self.0.trunc())
    }
}

/// One millimetre of water over one square metre is exactly one litre.
impl Mul<SquareMetres> for Millimetres {
    type Output = Litres;

    fn mul(self, rhs: SquareMetres) -> Self::Output {
        Litres(self.0 * rhs.0)
    }
}

impl Div<SquareMetres> for Litres {
    type Output = Millimetres;

    fn div(self, rhs: SquareMetres) -> Self::Output {
        Millimetres(self.0 / rhs.0)
    }
}
