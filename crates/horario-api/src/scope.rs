//! Caller identity and jornada scoping.
//!
//! Administrators see everything. Coordinators only see and manage the
//! jornadas they are assigned; the restriction is applied here, before the
//! [`horario_core::Scheduler`] is called, so the validation pipeline never
//! sees it.

use horario_core::{Error, assignment::AssignmentFilter};
use serde::{Deserialize, Serialize};

const OUT_OF_SCOPE: &str = "You do not have permission to manage this jornada";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Admin,
  Coordinator,
}

/// The authenticated caller, attached to each request as an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
  pub username: String,
  pub role:     Role,
  /// Jornada codes a coordinator manages. Ignored for administrators.
  pub jornadas: Vec<String>,
}

impl Caller {
  pub fn admin(username: impl Into<String>) -> Self {
    Self { username: username.into(), role: Role::Admin, jornadas: Vec::new() }
  }

  pub fn coordinator(username: impl Into<String>, jornadas: Vec<String>) -> Self {
    Self { username: username.into(), role: Role::Coordinator, jornadas }
  }

  pub fn is_scoped(&self) -> bool { self.role == Role::Coordinator }

  pub fn permits(&self, jornada: &str) -> bool {
    match self.role {
      Role::Admin => true,
      Role::Coordinator => self.jornadas.iter().any(|j| j == jornada.trim()),
    }
  }

  /// `Forbidden` unless `jornada` is within scope.
  pub fn authorize(&self, jornada: &str) -> Result<(), Error> {
    if self.permits(jornada) {
      Ok(())
    } else {
      Err(Error::Forbidden(OUT_OF_SCOPE.to_owned()))
    }
  }

  /// Narrow a listing filter to the caller's jornadas. An explicit jornada
  /// outside scope is refused rather than silently emptied.
  pub fn restrict(&self, mut filter: AssignmentFilter) -> Result<AssignmentFilter, Error> {
    if self.is_scoped() {
      if let Some(jornada) = &filter.jornada {
        self.authorize(jornada)?;
      }
      filter.jornadas_in = Some(self.jornadas.clone());
    }
    Ok(filter)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn coordinator() -> Caller { Caller::coordinator("maria", vec!["J1".into(), "J3".into()]) }

  #[test]
  fn admin_is_unrestricted() {
    let admin = Caller::admin("root");
    assert!(admin.permits("ANY"));
    let filter = admin.restrict(AssignmentFilter::default()).unwrap();
    assert_eq!(filter.jornadas_in, None);
  }

  #[test]
  fn coordinator_sees_only_own_jornadas() {
    let c = coordinator();
    assert!(c.permits("J1"));
    assert!(c.permits(" J3 "));
    assert!(!c.permits("J2"));
    assert_eq!(
      c.authorize("J2"),
      Err(Error::Forbidden("You do not have permission to manage this jornada".into()))
    );
  }

  #[test]
  fn restrict_adds_scope_and_checks_explicit_jornada() {
    let c = coordinator();
    let filter = c.restrict(AssignmentFilter::default()).unwrap();
    assert_eq!(filter.jornadas_in, Some(vec!["J1".into(), "J3".into()]));

    let foreign = AssignmentFilter { jornada: Some("J2".into()), ..Default::default() };
    assert!(matches!(c.restrict(foreign), Err(Error::Forbidden(_))));
  }
}
