use std::fmt;

use serde::Serialize;

/// Extraction strategy for a detail page, chosen from the candidate's status label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    PublicServer,
    Beneficiary,
    PensionInstitutor,
    GenericBenefit,
}

/// Marker substrings per strategy, in precedence order. `GenericBenefit` has none:
/// it is what remains.
const RULES: &[(Strategy, &[&str])] = &[
    (
        Strategy::PublicServer,
        &["servidor público", "servidor publico", "public server"],
    ),
    (
        Strategy::Beneficiary,
        &["beneficiário", "beneficiario", "beneficiary", "resource beneficiary"],
    ),
    (
        Strategy::PensionInstitutor,
        &["instituidor", "pensão", "pensao", "institutor", "pension"],
    ),
];

impl Strategy {
    /// Every strategy, in precedence order.
    pub const ALL: [Strategy; 4] = [
        Strategy::PublicServer,
        Strategy::Beneficiary,
        Strategy::PensionInstitutor,
        Strategy::GenericBenefit,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Strategy::PublicServer => "Public Server Details",
            Strategy::Beneficiary => "Resource Beneficiary Details",
            Strategy::PensionInstitutor => "Pension Institutor Details",
            Strategy::GenericBenefit => "Benefit Details",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::PublicServer => "public-server",
            Strategy::Beneficiary => "beneficiary",
            Strategy::PensionInstitutor => "pension-institutor",
            Strategy::GenericBenefit => "generic-benefit",
        };
        f.write_str(name)
    }
}

/// First rule whose marker occurs in the label (case-insensitive) wins.
pub fn classify(status_label: &str) -> Strategy {
    let label = status_label.to_lowercase();
    RULES
        .iter()
        .find(|(_, markers)| markers.iter().any(|m| label.contains(m)))
        .map(|(strategy, _)| *strategy)
        .unwrap_or(Strategy::GenericBenefit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portal_labels() {
        assert_eq!(classify("Servidor Público"), Strategy::PublicServer);
        assert_eq!(classify("Beneficiário de Recursos"), Strategy::Beneficiary);
        assert_eq!(classify("Instituidor de Pensão"), Strategy::PensionInstitutor);
        assert_eq!(classify("Bolsa Família"), Strategy::GenericBenefit);
    }

    #[test]
    fn english_markers() {
        assert_eq!(classify("Public Server (active)"), Strategy::PublicServer);
        assert_eq!(classify("Resource Beneficiary"), Strategy::Beneficiary);
        assert_eq!(classify("Pension"), Strategy::PensionInstitutor);
        assert_eq!(classify("Institutor"), Strategy::PensionInstitutor);
    }

    #[test]
    fn public_server_wins_over_everything() {
        for label in [
            "Servidor Público e Beneficiário",
            "Beneficiário; Servidor Público",
            "Pensão / Servidor Público / Beneficiary",
            "public server, pension institutor",
        ] {
            assert_eq!(classify(label), Strategy::PublicServer, "{}", label);
        }
    }

    #[test]
    fn beneficiary_wins_over_pension() {
        assert_eq!(classify("Beneficiário de Pensão"), Strategy::Beneficiary);
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(classify("SERVIDOR PÚBLICO"), Strategy::PublicServer);
        assert_eq!(classify("pensão alimentícia"), Strategy::PensionInstitutor);
    }

    #[test]
    fn unaccented_labels() {
        assert_eq!(classify("PENSAO"), Strategy::PensionInstitutor);
        assert_eq!(classify("Instituidor de Pensao"), Strategy::PensionInstitutor);
        assert_eq!(classify("BENEFICIARIO DE PROGRAMA SOCIAL"), Strategy::Beneficiary);
        assert_eq!(classify("SERVIDOR PUBLICO"), Strategy::PublicServer);
    }

    #[test]
    fn total_over_odd_input() {
        assert_eq!(classify(""), Strategy::GenericBenefit);
        assert_eq!(classify("   "), Strategy::GenericBenefit);
        assert_eq!(classify("Servidor"), Strategy::GenericBenefit);
    }

    #[test]
    fn every_strategy_is_reachable() {
        let labels = ["Servidor Público", "Beneficiário", "Pensão", "Auxílio Emergencial"];
        let got: Vec<_> = labels.iter().map(|l| classify(l)).collect();
        assert_eq!(got, Strategy::ALL);
    }
}
