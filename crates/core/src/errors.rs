use rust_decimal::Decimal;
use thiserror::Error;

use crate::config::ConfigError;
use crate::domain::fee::FeeType;
use crate::flows::Step;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("sale can only be scheduled from the contract step, current step is {step:?}")]
    InvalidSchedule { step: Step },
    #[error("{fee_type} payment plan still has {remaining} outstanding")]
    UnsettledPayment { fee_type: FeeType, remaining: Decimal },
    #[error("no target amount was set for the {fee_type} fee")]
    MissingFeeTarget { fee_type: FeeType },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl From<ConfigError> for ApplicationError {
    fn from(error: ConfigError) -> Self {
        Self::Configuration(error.to_string())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "A venda não pôde ser concluída. Revise os dados e tente novamente."
            }
            Self::Internal { .. } => "Ocorreu um erro interno inesperado.",
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Domain(error) => Self::BadRequest {
                message: error.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::config::ConfigError;
    use crate::domain::fee::FeeType;
    use crate::errors::{ApplicationError, DomainError, InterfaceError};
    use crate::flows::Step;

    #[test]
    fn domain_error_maps_to_bad_request_interface_error() {
        let interface = ApplicationError::from(DomainError::InvalidSchedule { step: Step::Payment })
            .into_interface("session-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest {
                ref correlation_id,
                ..
            } if correlation_id == "session-1"
        ));
    }

    #[test]
    fn unsettled_payment_message_names_the_fee() {
        let error = DomainError::UnsettledPayment {
            fee_type: FeeType::Exito,
            remaining: Decimal::from(25_000),
        };
        assert_eq!(error.to_string(), "Êxito payment plan still has 25000 outstanding");
    }

    #[test]
    fn bad_request_has_user_safe_message() {
        let interface =
            ApplicationError::from(DomainError::MissingFeeTarget { fee_type: FeeType::Prolabore })
                .into_interface("session-2");

        assert_eq!(
            interface.user_message(),
            "A venda não pôde ser concluída. Revise os dados e tente novamente."
        );
    }

    #[test]
    fn config_error_maps_to_internal() {
        let interface = ApplicationError::from(ConfigError::Validation(
            "discount.min_percent must not exceed discount.max_percent".to_owned(),
        ))
        .into_interface("config");

        assert!(matches!(
            interface,
            InterfaceError::Internal { ref message, .. }
                if message.contains("discount.min_percent must not exceed")
        ));
        assert_eq!(interface.user_message(), "Ocorreu um erro interno inesperado.");
    }
}
