//! Default MATH constants
//!
//! Derived from the TeX math fontdimens: `sigma` for the symbol font
//! (parameters 5 to 22) and `xi` for the extension font (8 to 13).

use std::collections::BTreeMap;

/// Font values the defaults depend on
#[derive(Debug, Clone)]
pub struct MathInputs<'a> {
    pub sigma: &'a BTreeMap<u32, i64>,
    pub xi: &'a BTreeMap<u32, i64>,
    pub em: f64,
    pub cap_height: f64,
}

/// Every constant that can be derived from `inputs`, already rounded
pub fn default_math_constants(inputs: &MathInputs<'_>) -> Vec<(&'static str, i64)> {
    let sigma = |k: u32| inputs.sigma.get(&k).map(|&v| v as f64);
    let xi = |k: u32| inputs.xi.get(&k).map(|&v| v as f64);
    let em = inputs.em;
    let times = |value: Option<f64>, factor: f64| value.map(|v| factor * v);

    let table: Vec<(&'static str, Option<f64>)> = vec![
        ("UpperLimitBaselineRiseMin", xi(11)),
        ("UpperLimitGapMin", xi(9)),
        ("LowerLimitGapMin", xi(10)),
        ("LowerLimitBaselineDropMin", xi(12)),
        ("StretchStackTopShiftUp", xi(11)),
        ("StretchStackGapAboveMin", xi(9)),
        ("StretchStackGapBelowMin", xi(10)),
        ("StretchStackBottomShiftDown", xi(12)),
        ("OverbarExtraAscender", xi(8)),
        ("OverbarRuleThickness", xi(8)),
        ("OverbarVerticalGap", times(xi(8), 3.0)),
        ("UnderbarVerticalGap", times(xi(8), 3.0)),
        ("UnderbarRuleThickness", xi(8)),
        ("UnderbarExtraDescender", xi(8)),
        ("FractionNumeratorDisplayStyleShiftUp", sigma(8)),
        ("FractionNumeratorShiftUp", sigma(9)),
        ("FractionNumeratorDisplayStyleGapMin", times(xi(8), 3.0)),
        ("FractionNumeratorGapMin", xi(8)),
        ("FractionRuleThickness", xi(8)),
        ("FractionDenominatorDisplayStyleGapMin", times(xi(8), 3.0)),
        ("FractionDenominatorGapMin", xi(8)),
        ("FractionDenominatorDisplayStyleShiftDown", sigma(11)),
        ("FractionDenominatorShiftDown", sigma(12)),
        ("StackTopDisplayStyleShiftUp", sigma(8)),
        ("StackTopShiftUp", sigma(10)),
        ("StackDisplayStyleGapMin", times(xi(8), 7.0)),
        ("StackGapMin", times(xi(8), 3.0)),
        ("StackBottomDisplayStyleShiftDown", sigma(11)),
        ("StackBottomShiftDown", sigma(12)),
        ("SuperscriptShiftUp", sigma(13)),
        ("SuperscriptShiftUpCramped", sigma(15)),
        ("SubscriptShiftDown", sigma(16)),
        ("SuperscriptBaselineDropMax", sigma(18)),
        ("SubscriptBaselineDropMin", sigma(19)),
        ("SuperscriptBottomMin", times(sigma(5), 0.25)),
        ("SubscriptTopMax", times(sigma(5), 0.8)),
        ("SubSuperscriptGapMin", times(xi(8), 4.0)),
        ("SuperscriptBottomMaxWithSubscript", times(sigma(5), 0.8)),
        ("SpaceAfterScript", Some(0.05 * em)),
        ("RadicalExtraAscender", xi(8)),
        ("RadicalRuleThickness", xi(8)),
        (
            "RadicalDisplayStyleVerticalGap",
            xi(8).zip(sigma(5)).map(|(x, s)| x + 0.25 * s),
        ),
        ("RadicalVerticalGap", times(xi(8), 1.25)),
        ("RadicalKernBeforeDegree", Some(5.0 / 18.0 * em)),
        ("RadicalKernAfterDegree", Some(10.0 / 18.0 * em)),
        ("RadicalDegreeBottomRaisePercent", Some(60.0)),
        ("ScriptPercentScaleDown", Some(70.0)),
        ("ScriptScriptPercentScaleDown", Some(50.0)),
        ("DisplayOperatorMinHeight", Some(1.4 * em)),
        ("DelimitedSubFormulaMinHeight", sigma(21)),
        ("AxisHeight", sigma(22)),
        ("AccentBaseHeight", sigma(5)),
        ("FlattenedAccentBaseHeight", Some(inputs.cap_height)),
        ("MathLeading", Some(3.0 / 18.0 * em)),
        ("MinConnectorOverlap", Some(0.0)),
    ];

    table
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v.round() as i64)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_without_fontdimens() {
        let empty = BTreeMap::new();
        let constants = default_math_constants(&MathInputs {
            sigma: &empty,
            xi: &empty,
            em: 1000.0,
            cap_height: 683.0,
        });
        let lookup = |name: &str| constants.iter().find(|(n, _)| *n == name).map(|(_, v)| *v);
        assert_eq!(lookup("AxisHeight"), None);
        assert_eq!(lookup("SpaceAfterScript"), Some(50));
        assert_eq!(lookup("RadicalKernBeforeDegree"), Some(278));
        assert_eq!(lookup("FlattenedAccentBaseHeight"), Some(683));
    }

    #[test]
    fn test_constants_from_fontdimens() {
        let sigma = BTreeMap::from([(5, 431), (22, 250)]);
        let xi = BTreeMap::from([(8, 40)]);
        let constants = default_math_constants(&MathInputs {
            sigma: &sigma,
            xi: &xi,
            em: 1000.0,
            cap_height: 683.0,
        });
        let lookup = |name: &str| constants.iter().find(|(n, _)| *n == name).map(|(_, v)| *v);
        assert_eq!(lookup("AxisHeight"), Some(250));
        assert_eq!(lookup("StackDisplayStyleGapMin"), Some(280));
        assert_eq!(lookup("RadicalDisplayStyleVerticalGap"), Some(148));
        assert_eq!(lookup("SuperscriptBottomMin"), Some(108));
    }
}
