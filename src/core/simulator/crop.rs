use crate::{
    core::error::SimulatorError,
    quantity::{
        crop_yield::TonnesPerHectare,
        temperature::{Celsius, DegreeDays},
    },
    weather::DailyWeather,
};

/// Crop parameters, with the stage lengths expressed in thermal time.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Crop {
    pub name: &'static str,

    /// No development below this temperature.
    pub base_temperature: Celsius,

    /// No additional development above this temperature.
    pub upper_temperature: Celsius,

    /// Thermal time from planting to maturity.
    pub maturity: DegreeDays,

    /// Typical calendar days from planting to maturity.
    pub maturity_days: u32,

    pub stages: GrowthStages,
    pub coefficients: CropCoefficients,
    pub root_depth: RootDepth,

    /// Fraction of the available soil water the crop extracts without stress.
    pub depletion_fraction: f64,

    /// Relative yield decrease per relative evapotranspiration deficit.
    pub yield_response_factor: f64,

    /// Yield without any water stress.
    pub potential_yield: TonnesPerHectare,
}

/// Stage lengths as fractions of the thermal time to maturity, the late season takes the rest.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GrowthStages {
    pub initial: f64,
    pub development: f64,
    pub mid_season: f64,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CropCoefficients {
    pub initial: f64,
    pub mid_season: f64,
    pub end: f64,
}

/// Effective rooting depth, in metres.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RootDepth {
    pub initial: f64,
    pub max: f64,
}

impl Crop {
    pub const MAIZE: Self = Self {
        name: "Maize",
        base_temperature: Celsius(8.0),
        upper_temperature: Celsius(30.0),
        maturity: DegreeDays(1700.0),
        maturity_days: 132,
        stages: GrowthStages { initial: 0.17, development: 0.28, mid_season: 0.33 },
        coefficients: CropCoefficients { initial: 0.3, mid_season: 1.2, end: 0.6 },
        root_depth: RootDepth { initial: 0.3, max: 1.2 },
        depletion_fraction: 0.55,
        yield_response_factor: 1.25,
        potential_yield: TonnesPerHectare(13.0),
    };

    pub const WHEAT: Self = Self {
        name: "Wheat",
        base_temperature: Celsius(0.0),
        upper_temperature: Celsius(26.0),
        maturity: DegreeDays(2400.0),
        maturity_days: 158,
        stages: GrowthStages { initial: 0.15, development: 0.25, mid_season: 0.4 },
        coefficients: CropCoefficients { initial: 0.3, mid_season: 1.15, end: 0.25 },
        root_depth: RootDepth { initial: 0.3, max: 1.5 },
        depletion_fraction: 0.55,
        yield_response_factor: 1.15,
        potential_yield: TonnesPerHectare(8.0),
    };

    pub const SORGHUM: Self = Self {
        name: "Sorghum",
        base_temperature: Celsius(8.0),
        upper_temperature: Celsius(30.0),
        maturity: DegreeDays(1900.0),
        maturity_days: 123,
        stages: GrowthStages { initial: 0.16, development: 0.27, mid_season: 0.33 },
        coefficients: CropCoefficients { initial: 0.3, mid_season: 1.0, end: 0.55 },
        root_depth: RootDepth { initial: 0.3, max: 1.2 },
        depletion_fraction: 0.55,
        yield_response_factor: 0.9,
        potential_yield: TonnesPerHectare(7.0),
    };

    pub const SOYBEAN: Self = Self {
        name: "Soybean",
        base_temperature: Celsius(5.0),
        upper_temperature: Celsius(30.0),
        maturity: DegreeDays(2100.0),
        maturity_days: 130,
        stages: GrowthStages { initial: 0.15, development: 0.2, mid_season: 0.45 },
        coefficients: CropCoefficients { initial: 0.4, mid_season: 1.15, end: 0.5 },
        root_depth: RootDepth { initial: 0.3, max: 1.0 },
        depletion_fraction: 0.5,
        yield_response_factor: 0.85,
        potential_yield: TonnesPerHectare(4.5),
    };

    pub const POTATO: Self = Self {
        name: "Potato",
        base_temperature: Celsius(2.0),
        upper_temperature: Celsius(26.0),
        maturity: DegreeDays(1900.0),
        maturity_days: 125,
        stages: GrowthStages { initial: 0.2, development: 0.25, mid_season: 0.35 },
        coefficients: CropCoefficients { initial: 0.5, mid_season: 1.15, end: 0.75 },
        root_depth: RootDepth { initial: 0.3, max: 0.6 },
        depletion_fraction: 0.35,
        yield_response_factor: 1.1,
        potential_yield: TonnesPerHectare(45.0),
    };

    pub const TOMATO: Self = Self {
        name: "Tomato",
        base_temperature: Celsius(7.0),
        upper_temperature: Celsius(28.0),
        maturity: DegreeDays(1900.0),
        maturity_days: 110,
        stages: GrowthStages { initial: 0.2, development: 0.27, mid_season: 0.33 },
        coefficients: CropCoefficients { initial: 0.6, mid_season: 1.15, end: 0.8 },
        root_depth: RootDepth { initial: 0.3, max: 1.0 },
        depletion_fraction: 0.4,
        yield_response_factor: 1.05,
        potential_yield: TonnesPerHectare(80.0),
    };

    pub const CATALOGUE: [Self; 6] =
        [Self::MAIZE, Self::WHEAT, Self::SORGHUM, Self::SOYBEAN, Self::POTATO, Self::TOMATO];

    /// Look the crop up by its case-insensitive name.
    pub fn from_name(name: &str) -> Result<Self, SimulatorError> {
        Self::CATALOGUE
            .into_iter()
            .find(|crop| matches_name(crop.name, name))
            .ok_or_else(|| SimulatorError::UnknownCrop(name.to_owned()))
    }

    /// Thermal time accumulated on the given day.
    pub fn degree_days(&self, day: &DailyWeather) -> DegreeDays {
        let max_temperature =
            day.max_temperature.clamp(self.base_temperature, self.upper_temperature);
        let min_temperature = day.min_temperature.min(self.upper_temperature);
        let mean = (max_temperature.0 + min_temperature.0) / 2.0;
        DegreeDays((mean - self.base_temperature.0).max(0.0))
    }

    /// Crop coefficient at the given development progress, from `0` at planting to `1` at maturity.
    #[must_use]
    pub fn coefficient(&self, progress: f64) -> f64 {
        let GrowthStages { initial, development, mid_season } = self.stages;
        let coefficients = self.coefficients;
        if progress < initial {
            coefficients.initial
        } else if progress < initial + development {
            let fraction = (progress - initial) / development;
            coefficients.initial + (coefficients.mid_season - coefficients.initial) * fraction
        } else if progress < initial + development + mid_season {
            coefficients.mid_season
        } else {
            let late = 1.0 - initial - development - mid_season;
            let fraction = ((progress - initial - development - mid_season) / late).min(1.0);
            coefficients.mid_season + (coefficients.end - coefficients.mid_season) * fraction
        }
    }

    /// Rooting depth, in metres: roots grow until the end of the development stage.
    #[must_use]
    pub fn rooting_depth(&self, progress: f64) -> f64 {
        let fraction = (progress / (self.stages.initial + self.stages.development)).min(1.0);
        self.root_depth.initial + (self.root_depth.max - self.root_depth.initial) * fraction
    }
}

/// Compare names ignoring case and separators, so that `sandy-loam` matches `SandyLoam`.
pub(super) fn matches_name(canonical: &str, name: &str) -> bool {
    let name = name.chars().filter(char::is_ascii_alphanumeric).map(|c| c.to_ascii_lowercase());
    canonical.chars().map(|c| c.to_ascii_lowercase()).eq(name)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::quantity::water::Millimetres;

    fn day(min_temperature: f64, max_temperature: f64) -> DailyWeather {
        DailyWeather {
            min_temperature: Celsius(min_temperature),
            max_temperature: Celsius(max_temperature),
            precipitation: Millimetres::ZERO,
            reference_evapotranspiration: Millimetres::ZERO,
        }
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(Crop::from_name("Maize").unwrap(), Crop::MAIZE);
        assert_eq!(Crop::from_name("maize").unwrap(), Crop::MAIZE);
        assert!(matches!(Crop::from_name("Banana"), Err(SimulatorError::UnknownCrop(_))));
    }

    #[test]
    fn degree_days() {
        assert_abs_diff_eq!(Crop::MAIZE.degree_days(&day(12.0, 24.0)).0, 10.0);

        // Capped at the upper temperature:
        assert_abs_diff_eq!(Crop::MAIZE.degree_days(&day(20.0, 40.0)).0, 17.0);

        // No development in the cold:
        assert_abs_diff_eq!(Crop::MAIZE.degree_days(&day(-5.0, 5.0)).0, 0.0);
    }

    #[test]
    fn coefficient_curve() {
        let crop = Crop::MAIZE;
        assert_abs_diff_eq!(crop.coefficient(0.0), 0.3);
        assert_abs_diff_eq!(crop.coefficient(0.17 + 0.14), 0.75, epsilon = 1e-9);
        assert_abs_diff_eq!(crop.coefficient(0.6), 1.2);
        assert_abs_diff_eq!(crop.coefficient(1.0), 0.6, epsilon = 1e-9);
    }

    #[test]
    fn roots_stop_growing_after_development() {
        let crop = Crop::MAIZE;
        assert_abs_diff_eq!(crop.rooting_depth(0.0), 0.3);
        assert_abs_diff_eq!(crop.rooting_depth(0.45), 1.2, epsilon = 1e-9);
        assert_abs_diff_eq!(crop.rooting_depth(0.9), 1.2);
    }
}
