//! Explicit instrumentation registry.
//!
//! Service classes declare their methods at definition time. A method timed
//! through a [`StatsClient`] carries a [`Timer`] record that the metric-config
//! generator reads back without invoking anything.

use crate::{BindingSet, ClassName, MethodName, MetricBinding, ModuleId, StatName, StatsdPrefix};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default statsd UDP port.
pub const DEFAULT_STATSD_PORT: u16 = 8125;

/// Statsd client configuration owned by a service class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsClient {
    /// Namespace prepended to every stat emitted by this client.
    pub prefix: StatsdPrefix,
    /// Optional statsd host.
    pub host: Option<Box<str>>,
    /// Statsd port.
    pub port: u16,
}

impl StatsClient {
    /// Build a client with the default port and no host.
    #[must_use]
    pub const fn new(prefix: StatsdPrefix) -> Self {
        Self {
            prefix,
            host: None,
            port: DEFAULT_STATSD_PORT,
        }
    }

    /// Set the host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<Box<str>>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Create a timer record for `stat` under this client's prefix.
    #[must_use]
    pub fn timer(&self, stat: StatName) -> Timer {
        Timer {
            client_prefix: self.prefix.clone(),
            stat,
        }
    }
}

/// Timing instrumentation attached to a method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    /// Prefix of the owning client at registration time.
    pub client_prefix: StatsdPrefix,
    /// Metric leaf name.
    pub stat: StatName,
}

/// A method declared on a service class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceMethod {
    /// Method name.
    pub name: MethodName,
    /// Entrypoint kind (`rpc`, `http`, `event`, `timer`), informational only.
    pub entrypoint: Option<Box<str>>,
    /// Timer, when the method is instrumented.
    pub timer: Option<Timer>,
}

/// A service class and its methods in registration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceClass {
    /// Class name.
    pub name: ClassName,
    /// Service name exposed to the framework, when declared.
    pub service: Option<Box<str>>,
    /// Statsd client owned by the class.
    pub statsd: Option<StatsClient>,
    /// Methods in registration order.
    pub methods: Vec<ServiceMethod>,
}

impl ServiceClass {
    /// Start declaring a class.
    #[must_use]
    pub fn builder(name: ClassName) -> ServiceClassBuilder {
        ServiceClassBuilder {
            class: Self {
                name,
                service: None,
                statsd: None,
                methods: Vec::new(),
            },
        }
    }

    /// Bindings contributed by this class, in method registration order.
    ///
    /// Methods without a timer are skipped.
    pub fn bindings(&self) -> impl Iterator<Item = MetricBinding> + '_ {
        self.methods.iter().filter_map(|method| {
            method.timer.as_ref().map(|timer| MetricBinding {
                statsd_prefix: timer.client_prefix.clone(),
                stat_name: timer.stat.clone(),
                class_name: self.name.clone(),
            })
        })
    }
}

/// Builder registering methods on a [`ServiceClass`].
#[derive(Debug, Clone)]
pub struct ServiceClassBuilder {
    class: ServiceClass,
}

impl ServiceClassBuilder {
    /// Set the framework service name.
    #[must_use]
    pub fn service(mut self, service: impl Into<Box<str>>) -> Self {
        self.class.service = Some(service.into());
        self
    }

    /// Attach the class statsd client.
    #[must_use]
    pub fn statsd(mut self, client: StatsClient) -> Self {
        self.class.statsd = Some(client);
        self
    }

    /// Register an uninstrumented method.
    #[must_use]
    pub fn method(mut self, name: MethodName) -> Self {
        self.class.methods.push(ServiceMethod {
            name,
            entrypoint: None,
            timer: None,
        });
        self
    }

    /// Register a method timed by `timer`.
    #[must_use]
    pub fn timed(mut self, name: MethodName, timer: &Timer) -> Self {
        self.class.methods.push(ServiceMethod {
            name,
            entrypoint: None,
            timer: Some(timer.clone()),
        });
        self
    }

    /// Register a fully described method.
    #[must_use]
    pub fn push(mut self, method: ServiceMethod) -> Self {
        self.class.methods.push(method);
        self
    }

    /// Finish the declaration.
    #[must_use]
    pub fn build(self) -> ServiceClass {
        self.class
    }
}

/// A resolved module: its classes in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceModule {
    /// Classes in declaration order.
    pub classes: Vec<ServiceClass>,
}

impl ServiceModule {
    /// Create a module from classes.
    #[must_use]
    pub const fn new(classes: Vec<ServiceClass>) -> Self {
        Self { classes }
    }

    /// Look up a class by exact name.
    #[must_use]
    pub fn class(&self, name: &ClassName) -> Option<&ServiceClass> {
        self.classes.iter().find(|class| &class.name == name)
    }

    /// Collect bindings for `requested` classes, in request order.
    ///
    /// Returns the first class that is not part of this module as the error.
    pub fn collect_bindings(&self, requested: &[ClassName]) -> Result<BindingSet, ClassName> {
        let mut bindings = Vec::new();
        for name in requested {
            let Some(class) = self.class(name) else {
                return Err(name.clone());
            };
            bindings.extend(class.bindings());
        }
        Ok(BindingSet::new(bindings))
    }
}

/// Registry of modules populated at definition time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricRegistry {
    modules: BTreeMap<ModuleId, ServiceModule>,
}

impl MetricRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class under `module`, appending to existing classes.
    pub fn register(&mut self, module: &ModuleId, class: ServiceClass) {
        self.modules
            .entry(module.clone())
            .or_default()
            .classes
            .push(class);
    }

    /// Builder-style registration.
    #[must_use]
    pub fn with_class(mut self, module: &ModuleId, class: ServiceClass) -> Self {
        self.register(module, class);
        self
    }

    /// Look up a module.
    #[must_use]
    pub fn module(&self, module: &ModuleId) -> Option<&ServiceModule> {
        self.modules.get(module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PrimitiveError;

    fn responder() -> Result<ServiceClass, PrimitiveError> {
        let statsd = StatsClient::new(StatsdPrefix::parse("svcA")?);
        let hello = statsd.timer(StatName::parse("hello")?);
        Ok(ServiceClass::builder(ClassName::parse("A")?)
            .statsd(statsd)
            .method(MethodName::parse("setup")?)
            .timed(MethodName::parse("hello")?, &hello)
            .build())
    }

    #[test]
    fn bindings_read_timer_values_exactly() -> Result<(), Box<dyn std::error::Error>> {
        let class = responder()?;
        let bindings: Vec<_> = class.bindings().collect();
        assert_eq!(bindings.len(), 1);
        let binding = bindings.first().ok_or("one binding")?;
        assert_eq!(binding.statsd_prefix.as_str(), "svcA");
        assert_eq!(binding.stat_name.as_str(), "hello");
        assert_eq!(binding.class_name.as_str(), "A");
        Ok(())
    }

    #[test]
    fn collect_bindings_follows_request_order() -> Result<(), Box<dyn std::error::Error>> {
        let statsd = StatsClient::new(StatsdPrefix::parse("svcB")?);
        let other = ServiceClass::builder(ClassName::parse("B")?)
            .timed(MethodName::parse("b1")?, &statsd.timer(StatName::parse("b1")?))
            .build();
        let module = ServiceModule::new(vec![responder()?, other]);

        let requested = [ClassName::parse("B")?, ClassName::parse("A")?];
        let set = module
            .collect_bindings(&requested)
            .map_err(|missing| format!("unresolved class {missing}"))?;
        let stats: Vec<_> = set.iter().map(|b| b.stat_name.as_str()).collect();
        assert_eq!(stats, ["b1", "hello"]);
        Ok(())
    }

    #[test]
    fn collect_bindings_reports_missing_class() -> Result<(), PrimitiveError> {
        let module = ServiceModule::new(vec![responder()?]);
        let missing = ClassName::parse("Nope")?;
        let result = module.collect_bindings(&[ClassName::parse("A")?, missing.clone()]);
        assert_eq!(result, Err(missing));
        Ok(())
    }

    #[test]
    fn registry_groups_classes_by_module() -> Result<(), PrimitiveError> {
        let module = ModuleId::parse("demo.rpc")?;
        let registry = MetricRegistry::new().with_class(&module, responder()?);
        let found = registry.module(&module).map(|m| m.classes.len());
        assert_eq!(found, Some(1));
        assert!(registry.module(&ModuleId::parse("demo.other")?).is_none());
        Ok(())
    }
}
