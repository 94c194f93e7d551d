//! Every supported rig model, looked up by name.
//!
//! Names match case- and hyphen-insensitively, so `IC-7300`, `ic7300` and
//! `Ic-7300` all find the same entry.

use rigbridge_core::{model_id, Error, Manufacturer, ProtocolEngine, Result, RigCapabilities};

#[derive(Debug, Clone)]
enum Backend {
    #[cfg(feature = "civ")]
    Civ(rigbridge_civ::IcomModel),
    #[cfg(feature = "cat")]
    Cat(rigbridge_cat::CatModel),
}

/// One registry row.
#[derive(Debug, Clone)]
pub struct ModelEntry {
    /// Normalized lookup key (e.g. `ic7300`).
    pub id: String,
    /// Display name (e.g. `IC-7300`).
    pub name: &'static str,
    pub manufacturer: Manufacturer,
    pub default_baud_rate: u32,
    pub capabilities: RigCapabilities,
    backend: Backend,
}

impl ModelEntry {
    #[cfg(feature = "civ")]
    fn civ(model: rigbridge_civ::IcomModel) -> Self {
        ModelEntry {
            id: model_id(model.name),
            name: model.name,
            manufacturer: Manufacturer::Icom,
            default_baud_rate: model.default_baud_rate,
            capabilities: model.capabilities.clone(),
            backend: Backend::Civ(model),
        }
    }

    #[cfg(feature = "cat")]
    fn cat(model: rigbridge_cat::CatModel) -> Self {
        ModelEntry {
            id: model_id(model.name),
            name: model.name,
            manufacturer: model.manufacturer,
            default_baud_rate: model.default_baud_rate,
            capabilities: model.capabilities.clone(),
            backend: Backend::Cat(model),
        }
    }

    /// Wire protocol family, for listings.
    pub fn protocol(&self) -> &'static str {
        match self.backend {
            #[cfg(feature = "civ")]
            Backend::Civ(_) => "CI-V",
            #[cfg(feature = "cat")]
            Backend::Cat(_) => "CAT",
        }
    }

    /// Build the protocol engine for this model.
    ///
    /// `civ_address` overrides the factory CI-V address and is rejected for
    /// text-protocol rigs.
    pub fn engine(&self, civ_address: Option<u8>) -> Result<Box<dyn ProtocolEngine>> {
        match &self.backend {
            #[cfg(feature = "civ")]
            Backend::Civ(model) => {
                let engine = match civ_address {
                    Some(addr) => rigbridge_civ::CivEngine::with_address(model.clone(), addr),
                    None => rigbridge_civ::CivEngine::new(model.clone()),
                };
                Ok(Box::new(engine))
            }
            #[cfg(feature = "cat")]
            Backend::Cat(model) => match civ_address {
                Some(_) => Err(Error::InvalidParameter(format!(
                    "{} does not use a CI-V address",
                    model.name
                ))),
                None => Ok(Box::new(rigbridge_cat::CatEngine::new(model.clone()))),
            },
        }
    }
}

/// All models from the enabled backends, CI-V first.
pub fn list_models() -> Vec<ModelEntry> {
    let mut models = Vec::new();

    #[cfg(feature = "civ")]
    models.extend(
        rigbridge_civ::models::all_icom_models()
            .into_iter()
            .map(ModelEntry::civ),
    );

    #[cfg(feature = "cat")]
    models.extend(
        rigbridge_cat::models::all_cat_models()
            .into_iter()
            .map(ModelEntry::cat),
    );

    models
}

/// Look up a model by name or id.
pub fn find_model(name: &str) -> Result<ModelEntry> {
    let wanted = model_id(name);
    let models = list_models();
    let known: Vec<&str> = models.iter().map(|m| m.name).collect();
    let message = format!("unknown model '{name}'. Supported models: {}", known.join(", "));
    models
        .iter()
        .find(|m| m.id == wanted)
        .cloned()
        .ok_or(Error::InvalidParameter(message))
}

#[cfg(all(test, feature = "civ", feature = "cat"))]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case_and_hyphens() {
        assert_eq!(find_model("IC-7300").unwrap().name, "IC-7300");
        assert_eq!(find_model("ic7300").unwrap().name, "IC-7300");
        assert_eq!(find_model("ft-dx10").unwrap().name, "FT-DX10");
        assert_eq!(find_model("K3").unwrap().manufacturer, Manufacturer::Elecraft);
    }

    #[test]
    fn unknown_model_lists_alternatives() {
        let err = find_model("IC-9999").unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
        assert!(err.to_string().contains("IC-7300"));
    }

    #[test]
    fn ids_are_unique() {
        let models = list_models();
        let mut ids: Vec<&str> = models.iter().map(|m| m.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), models.len());
    }

    #[test]
    fn engine_carries_model_identity() {
        let engine = find_model("TS-590SG").unwrap().engine(None).unwrap();
        assert_eq!(engine.info().model_name, "TS-590SG");
        assert_eq!(engine.info().model_id, "ts590sg");
        assert_eq!(engine.info().manufacturer, Manufacturer::Kenwood);
    }

    #[test]
    fn civ_address_only_for_icom() {
        let entry = find_model("IC-7300").unwrap();
        assert_eq!(entry.protocol(), "CI-V");
        assert!(entry.engine(Some(0x98)).is_ok());

        let entry = find_model("KX3").unwrap();
        assert_eq!(entry.protocol(), "CAT");
        assert!(matches!(
            entry.engine(Some(0x98)),
            Err(Error::InvalidParameter(_))
        ));
    }
}
