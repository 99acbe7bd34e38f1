quantity!(Celsius, suffix: "°C", precision: 1);

// Thermal time accumulated above the base temperature of a crop:
quantity!(DegreeDays, suffix: "°C·d", precision: 0);
