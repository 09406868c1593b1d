//! Recognition labels → canonical component names.

/// `(key, canonical name)`. Matching walks the table in order, so a short
/// key listed early shadows longer phrases further down.
const SYNONYMS: &[(&str, &str)] = &[
    ("resistor", "Resistor"),
    ("capacitor", "Capacitor"),
    ("transistor", "Transistor"),
    ("diode", "Diode"),
    ("led", "LED"),
    ("inductor", "Inductor"),
    ("integrated circuit", "Integrated Circuit"),
    ("ic", "Integrated Circuit"),
    ("chip", "Integrated Circuit"),
    ("transformer", "Transformer"),
    ("relay", "Relay"),
    ("fuse", "Fuse"),
    ("switch", "Switch"),
    ("button", "Button"),
    ("connector", "Connector"),
    ("battery", "Battery"),
    ("motor", "Motor"),
    ("speaker", "Speaker"),
    ("microphone", "Microphone"),
    ("sensor", "Sensor"),
    ("crystal", "Crystal Oscillator"),
    ("oscillator", "Crystal Oscillator"),
    ("voltage regulator", "Voltage Regulator"),
    ("potentiometer", "Potentiometer"),
    ("electronic component", "Electronic Component"),
    ("circuit board", "Circuit Board"),
    ("pcb", "Circuit Board"),
    ("printed circuit board", "Circuit Board"),
];

/// Canonical component name for a free-form label: the first key of the
/// table contained in the lowercased label.
pub fn canonical_component(label: &str) -> Option<&'static str> {
    let lower = label.to_lowercase();
    SYNONYMS
        .iter()
        .find(|(key, _)| lower.contains(key))
        .map(|&(_, name)| name)
}

/// Every canonical name the table can produce, sorted and deduplicated.
pub fn canonical_names() -> Vec<&'static str> {
    let mut names: Vec<_> = SYNONYMS.iter().map(|&(_, n)| n).collect();
    names.sort_unstable();
    names.dedup();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_labels() {
        assert_eq!(canonical_component("Resistor"), Some("Resistor"));
        assert_eq!(canonical_component("LED"), Some("LED"));
        assert_eq!(canonical_component("IC"), Some("Integrated Circuit"));
        assert_eq!(canonical_component("Crystal"), Some("Crystal Oscillator"));
        assert_eq!(canonical_component("Printed circuit board"), Some("Circuit Board"));
    }

    #[test]
    fn keys_match_anywhere_in_the_label() {
        assert_eq!(canonical_component("Electrolytic capacitors"), Some("Capacitor"));
        assert_eq!(canonical_component("SMD LEDs"), Some("LED"));
        assert_eq!(canonical_component("Electronics"), Some("Integrated Circuit"));
        assert_eq!(canonical_component("Microcontroller"), Some("Integrated Circuit"));
        assert_eq!(canonical_component("Sled"), Some("LED"));
    }

    #[test]
    fn earlier_keys_shadow_later_phrases() {
        assert_eq!(
            canonical_component("Electronic component"),
            Some("Integrated Circuit")
        );
        // "diode" comes before "led"
        assert_eq!(canonical_component("light-emitting diode"), Some("Diode"));
        assert_eq!(canonical_component("Light emitting diode (LED)"), Some("Diode"));
        assert_eq!(canonical_component("Voltage regulator"), Some("Voltage Regulator"));
    }

    #[test]
    fn unrelated_labels_do_not_map() {
        for label in ["Table", "Hardware", "Person", "Wood", ""] {
            assert_eq!(canonical_component(label), None, "{label}");
        }
    }

    #[test]
    fn names_are_unique() {
        let names = canonical_names();
        assert!(names.contains(&"Circuit Board"));
        assert_eq!(names.iter().filter(|n| **n == "Integrated Circuit").count(), 1);
    }
}
