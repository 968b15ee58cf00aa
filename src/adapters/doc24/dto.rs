//! Doc24 request and response bodies.

use serde::{Deserialize, Serialize};

use crate::domain::activation::ActivationMessage;

#[derive(Debug, Clone, Serialize)]
pub struct AuthenticationRequest<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthenticationResponse {
    #[serde(alias = "token")]
    pub access_token: String,
    #[serde(default)]
    pub expires_in: u64,
}

/// Eligibility record for one affiliate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Affiliate {
    pub nombre: String,
    pub apellido: String,
    /// `M` or `F`.
    pub sexo: String,
    /// `YYYY-MM-DD`
    pub fecha_nacimiento: String,
    pub identificacion_tributaria: String,
    pub nro_documento: String,
    pub nro_documento_titular: String,
    pub plan: String,
    pub empresa: String,
    pub credencial: String,
    /// Enrollment date, `YYYY-MM-DD`.
    pub fecha_alta: String,
    pub telefono_movil: String,
    pub email: String,
}

impl Affiliate {
    /// Builds the affiliate for a holder enrolling on their own CPF.
    pub fn from_message(
        message: &ActivationMessage,
        empresa: &str,
        default_plan: &str,
        enrolled_on: &str,
    ) -> Self {
        let (nombre, apellido) = split_name(&message.name);
        let plan = if message.provider_plan_code.trim().is_empty() {
            default_plan.to_string()
        } else {
            message.provider_plan_code.clone()
        };

        Self {
            nombre,
            apellido,
            sexo: sex_code(&message.gender).to_string(),
            fecha_nacimiento: message.birth_date.clone(),
            identificacion_tributaria: message.cpf.clone(),
            nro_documento: message.cpf.clone(),
            nro_documento_titular: message.cpf.clone(),
            plan,
            empresa: empresa.to_string(),
            credencial: message.cpf.clone(),
            fecha_alta: enrolled_on.to_string(),
            telefono_movil: message.phone.clone(),
            email: message.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EligibilityResponse {
    /// 1 on success.
    #[serde(default)]
    pub estado: i64,
    #[serde(default)]
    pub mensaje: String,
}

/// First word and the rest.
fn split_name(full: &str) -> (String, String) {
    let full = full.trim();
    match full.split_once(' ') {
        Some((first, rest)) => (first.to_string(), rest.trim().to_string()),
        None => (full.to_string(), String::new()),
    }
}

fn sex_code(gender: &str) -> &'static str {
    let gender = gender.trim();
    if gender == "0" || gender.eq_ignore_ascii_case("F") {
        "F"
    } else {
        "M"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::activation::ActivationOrigin;
    use crate::domain::checkout::ProviderCode;
    use crate::domain::foundation::{CustomerId, PlanId};

    fn message(name: &str, gender: &str, plan_code: &str) -> ActivationMessage {
        ActivationMessage {
            customer_id: CustomerId::new(),
            plan_id: PlanId::new(),
            provider: ProviderCode::doc24(),
            provider_plan_code: plan_code.to_string(),
            origin: ActivationOrigin::Webhook,
            name: name.to_string(),
            email: "ana@example.com".to_string(),
            cpf: "52998224725".to_string(),
            phone: "11987654321".to_string(),
            birth_date: "1990-04-12".to_string(),
            gender: gender.to_string(),
        }
    }

    #[test]
    fn splits_name_on_first_space() {
        let affiliate = Affiliate::from_message(
            &message("Ana Paula Lima", "F", "PLAN"),
            "Ag Med",
            "default",
            "2026-01-01",
        );
        assert_eq!(affiliate.nombre, "Ana");
        assert_eq!(affiliate.apellido, "Paula Lima");
    }

    #[test]
    fn single_word_name_has_empty_surname() {
        let affiliate =
            Affiliate::from_message(&message("Ana", "F", "PLAN"), "Ag Med", "default", "2026-01-01");
        assert_eq!(affiliate.nombre, "Ana");
        assert_eq!(affiliate.apellido, "");
    }

    #[test]
    fn maps_gender_codes() {
        assert_eq!(sex_code("0"), "F");
        assert_eq!(sex_code("f"), "F");
        assert_eq!(sex_code("1"), "M");
        assert_eq!(sex_code(""), "M");
    }

    #[test]
    fn empty_plan_code_falls_back_to_default() {
        let affiliate = Affiliate::from_message(
            &message("Ana Lima", "F", "  "),
            "Ag Med",
            "ligue saude em dia individual",
            "2026-01-01",
        );
        assert_eq!(affiliate.plan, "ligue saude em dia individual");
    }

    #[test]
    fn cpf_fills_every_document_field() {
        let affiliate =
            Affiliate::from_message(&message("Ana Lima", "F", "P"), "Ag Med", "d", "2026-01-01");
        assert_eq!(affiliate.identificacion_tributaria, "52998224725");
        assert_eq!(affiliate.nro_documento, "52998224725");
        assert_eq!(affiliate.nro_documento_titular, "52998224725");
        assert_eq!(affiliate.credencial, "52998224725");
    }

    #[test]
    fn token_response_accepts_legacy_field_name() {
        let parsed: AuthenticationResponse =
            serde_json::from_str(r#"{"token":"abc","expires_in":0}"#).unwrap();
        assert_eq!(parsed.access_token, "abc");
        assert_eq!(parsed.expires_in, 0);
    }
}
