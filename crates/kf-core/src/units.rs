// kf-core/src/units.rs

use uom::si::f64::{
    AmountOfSubstance as UomAmount, Mass as UomMass, MolarMass as UomMolarMass,
    Pressure as UomPressure, ThermodynamicTemperature as UomThermodynamicTemperature,
    Volume as UomVolume,
};

// Public canonical unit types (SI, f64)
pub type Amount = UomAmount;
pub type Mass = UomMass;
pub type MolarMass = UomMolarMass;
pub type Pressure = UomPressure;
pub type Temperature = UomThermodynamicTemperature;
pub type Volume = UomVolume;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn mol(v: f64) -> Amount {
    use uom::si::amount_of_substance::mole;
    Amount::new::<mole>(v)
}

#[inline]
pub fn kg(v: f64) -> Mass {
    use uom::si::mass::kilogram;
    Mass::new::<kilogram>(v)
}

#[inline]
pub fn kg_per_mol(v: f64) -> MolarMass {
    use uom::si::molar_mass::kilogram_per_mole;
    MolarMass::new::<kilogram_per_mole>(v)
}

#[inline]
pub fn m3(v: f64) -> Volume {
    use uom::si::volume::cubic_meter;
    Volume::new::<cubic_meter>(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_store_si_values() {
        assert_eq!(pa(101_325.0).value, 101_325.0);
        assert_eq!(k(298.15).value, 298.15);
        assert_eq!(mol(0.5).value, 0.5);
        assert_eq!(kg(2.0).value, 2.0);
        assert_eq!(kg_per_mol(0.018).value, 0.018);
        assert_eq!(m3(1e-3).value, 1e-3);
    }

    #[test]
    fn amount_over_molar_mass_is_mass() {
        let m: Mass = mol(2.0) * kg_per_mol(0.018);
        assert!((m.value - 0.036).abs() < 1e-15);
    }
}
