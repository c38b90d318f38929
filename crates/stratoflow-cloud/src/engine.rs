//! Plan / apply engine
//!
//! Drives the registered providers through validate, refresh, plan, apply,
//! destroy and import. All operations run sequentially in dependency order.

use crate::action::{Action, ActionType, ApplyResult, Plan};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{CloudError, Result};
use crate::provider::CloudProvider;
use crate::resource::{DataSource, Resource};
use crate::resource_data::ResourceData;
use crate::schema::Schema;
use crate::state::{GlobalState, OutputState, ResourceState, ResourceStatus, StateManager};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;
use stratoflow_core::{
    Attributes, DATA_PREFIX, Reference, ResourceBlock, Stack, Timeouts, contains_unknown,
    provider_of, references_in, resolve_references,
};
use tracing::{debug, info, warn};

/// Outcome of a refresh
#[derive(Debug, Default)]
pub struct RefreshReport {
    /// Addresses whose state was re-read
    pub refreshed: Vec<String>,

    /// Addresses removed because the remote object is gone
    pub removed: Vec<String>,
}

/// Registry of providers plus the operations that drive them
#[derive(Default)]
pub struct Engine {
    providers: BTreeMap<String, Arc<dyn CloudProvider>>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: Arc<dyn CloudProvider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    pub fn with_provider(mut self, provider: Arc<dyn CloudProvider>) -> Self {
        self.register(provider);
        self
    }

    pub fn provider(&self, name: &str) -> Option<&Arc<dyn CloudProvider>> {
        self.providers.get(name)
    }

    pub fn providers(&self) -> impl Iterator<Item = &Arc<dyn CloudProvider>> {
        self.providers.values()
    }

    fn provider_for(&self, type_name: &str) -> Result<&Arc<dyn CloudProvider>> {
        let name = provider_of(type_name);
        self.providers
            .get(name)
            .ok_or_else(|| CloudError::ProviderNotFound(name.to_string()))
    }

    pub fn resource_impl(&self, type_name: &str) -> Result<Arc<dyn Resource>> {
        self.provider_for(type_name)?
            .resource(type_name)
            .ok_or_else(|| CloudError::UnsupportedResourceType(type_name.to_string()))
    }

    pub fn data_source_impl(&self, type_name: &str) -> Result<Arc<dyn DataSource>> {
        self.provider_for(type_name)?
            .data_source(type_name)
            .ok_or_else(|| CloudError::UnsupportedResourceType(format!("data.{}", type_name)))
    }

    /// Schema of the block at an address, if the address and type are known
    fn schema_at(&self, stack: &Stack, address: &str) -> Option<Schema> {
        if address.starts_with(DATA_PREFIX) {
            let block = stack.find_data(address)?;
            self.data_source_impl(&block.data_type).ok().map(|d| d.schema())
        } else {
            let block = stack.find_resource(address)?;
            self.resource_impl(&block.resource_type).ok().map(|r| r.schema())
        }
    }

    /// Check the whole stack without touching the remote API
    pub fn validate(&self, stack: &Stack) -> Diagnostics {
        let mut diags = Diagnostics::new();

        for name in stack.required_providers() {
            if !self.providers.contains_key(&name) {
                diags.push(
                    Diagnostic::error(format!("Unknown provider \"{}\"", name))
                        .with_detail("No provider with this name is available"),
                );
            }
        }

        for block in &stack.resources {
            let address = block.address();
            let resource = match self.resource_impl(&block.resource_type) {
                Ok(resource) => resource,
                Err(CloudError::ProviderNotFound(_)) => continue,
                Err(e) => {
                    diags.push(Diagnostic::error(e.to_string()).with_address(&address));
                    continue;
                }
            };

            let schema = resource.schema();
            let config = schema.normalize(&resolve_attributes(&block.attributes, |_| None));
            let mut found = schema.validate(&config);
            found.extend(resource.validate(&config));
            diags.extend(found.for_address(&address));
        }

        for block in &stack.data_sources {
            let address = block.address();
            let data_source = match self.data_source_impl(&block.data_type) {
                Ok(data_source) => data_source,
                Err(CloudError::ProviderNotFound(_)) => continue,
                Err(e) => {
                    diags.push(Diagnostic::error(e.to_string()).with_address(&address));
                    continue;
                }
            };

            let schema = data_source.schema();
            let config = schema.normalize(&resolve_attributes(&block.attributes, |_| None));
            diags.extend(schema.validate(&config).for_address(&address));
        }

        let referencing = stack
            .resources
            .iter()
            .map(|r| (r.address(), Value::Object(r.attributes.clone())))
            .chain(
                stack
                    .data_sources
                    .iter()
                    .map(|d| (d.address(), Value::Object(d.attributes.clone()))),
            )
            .chain(
                stack
                    .outputs
                    .iter()
                    .map(|o| (format!("output.{}", o.name), o.value.clone())),
            );

        for (address, value) in referencing {
            for reference in references_in(&value) {
                let Some(schema) = self.schema_at(stack, &reference.address) else {
                    continue;
                };
                if let Some(first) = reference.path.first()
                    && first != "id"
                    && schema.get(first).is_none()
                {
                    diags.push(
                        Diagnostic::error("Unsupported attribute")
                            .with_address(&address)
                            .with_detail(format!(
                                "{} has no attribute \"{}\"",
                                reference.address, first
                            )),
                    );
                }
            }
        }

        if let Err(e) = stack
            .dependency_graph()
            .and_then(|graph| graph.topological_order())
        {
            diags.push(Diagnostic::error(e.to_string()));
        }

        diags
    }

    /// Re-read every resource in state
    pub async fn refresh(&self, stack: &Stack, state: &mut GlobalState) -> Result<RefreshReport> {
        let mut report = RefreshReport::default();
        let addresses: Vec<String> = state.resources.keys().cloned().collect();

        for address in addresses {
            let Some(current) = state.get_resource(&address).cloned() else {
                continue;
            };
            let resource = self.resource_impl(&current.resource_type)?;
            let mut data = ResourceData::from_state(&address, &current.id, current.attributes)
                .with_timeouts(timeouts_for(stack.find_resource(&address), resource.as_ref()));

            debug!("Refreshing {}", address);
            resource.read(&mut data).await?;

            if data.id().is_none() {
                warn!("{} no longer exists remotely, removing it from state", address);
                state.remove_resource(&address);
                report.removed.push(address);
            } else if let Some(entry) = state.get_resource_mut(&address) {
                entry.attributes = data.into_attributes();
                entry.updated_at = chrono::Utc::now();
                report.refreshed.push(address);
            }
        }

        Ok(report)
    }

    /// Compute the actions that bring the remote side in line with the stack
    pub async fn plan(&self, stack: &Stack, state: &GlobalState) -> Result<Plan> {
        let diags = self.validate(stack);
        if diags.has_errors() {
            return Err(CloudError::Validation(diags));
        }

        let order = stack.dependency_graph()?.topological_order()?;
        let mut actions = self.plan_orphans(stack, state)?;
        let mut known: BTreeMap<String, Value> = BTreeMap::new();
        let mut data_results = BTreeMap::new();

        for address in &order {
            if let Some(block) = stack.find_data(address) {
                let config = resolve_attributes(&block.attributes, |r| lookup_in(&known, r));
                if contains_unknown(&Value::Object(config.clone())) {
                    debug!("Deferring {} until apply", address);
                    continue;
                }
                let attributes = self.read_data(address, &block.data_type, config).await?;
                known.insert(address.clone(), Value::Object(attributes.clone()));
                data_results.insert(address.clone(), attributes);
                continue;
            }

            let Some(block) = stack.find_resource(address) else {
                continue;
            };
            let schema = self.resource_impl(&block.resource_type)?.schema();
            let config =
                schema.normalize(&resolve_attributes(&block.attributes, |r| lookup_in(&known, r)));

            let (action, planned) = plan_resource(block, &schema, config, state.get_resource(address));
            debug!("{}: {}", address, action.action_type);
            known.insert(address.clone(), planned);
            actions.push(action);
        }

        Ok(Plan::new(actions).with_data(data_results))
    }

    /// Deletes for resources in state that the stack no longer declares
    fn plan_orphans(&self, stack: &Stack, state: &GlobalState) -> Result<Vec<Action>> {
        let graph = state.dependency_graph()?;
        let mut actions = Vec::new();

        for address in graph.reverse_topological_order()? {
            if stack.find_resource(&address).is_some() {
                continue;
            }
            if let Some(resource) = state.get_resource(&address) {
                actions.push(
                    Action::new(&address, ActionType::Delete, &resource.resource_type)
                        .with_id(&resource.id)
                        .with_reason("no longer in configuration"),
                );
            }
        }

        Ok(actions)
    }

    /// Deletes for everything in state, or for one target and its dependents
    pub fn plan_destroy(&self, state: &GlobalState, target: Option<&str>) -> Result<Plan> {
        let graph = state.dependency_graph()?;

        let selected = match target {
            Some(target) => {
                if state.get_resource(target).is_none() {
                    return Err(CloudError::ResourceNotFound(format!(
                        "{} is not in state",
                        target
                    )));
                }
                let mut selected = graph.dependents_of(target);
                selected.insert(target.to_string());
                Some(selected)
            }
            None => None,
        };

        let mut actions = Vec::new();
        for address in graph.reverse_topological_order()? {
            if selected.as_ref().is_some_and(|s| !s.contains(&address)) {
                continue;
            }
            if let Some(resource) = state.get_resource(&address) {
                actions.push(
                    Action::new(&address, ActionType::Delete, &resource.resource_type)
                        .with_id(&resource.id),
                );
            }
        }

        Ok(Plan::new(actions))
    }

    /// Execute a plan produced by [`Engine::plan`]
    ///
    /// State is saved after every resource operation. Deletes and the old
    /// halves of replacements run first in reverse dependency order, then
    /// creates and updates run forward. A failed operation skips everything
    /// that depends on it.
    pub async fn apply(
        &self,
        stack: &Stack,
        plan: &Plan,
        state: &mut GlobalState,
        store: &StateManager,
    ) -> Result<ApplyResult> {
        let started = Instant::now();
        let mut result = ApplyResult::new();
        let mut failed: BTreeSet<String> = BTreeSet::new();

        self.execute_deletes(Some(stack), plan, state, store, &mut result, &mut failed)
            .await?;

        let graph = stack.dependency_graph()?;
        let mut data: BTreeMap<String, Value> = plan
            .data
            .iter()
            .map(|(address, attributes)| (address.clone(), Value::Object(attributes.clone())))
            .collect();

        for address in graph.topological_order()? {
            let action_type = if stack.find_data(&address).is_some() {
                if data.contains_key(&address) {
                    continue;
                }
                ActionType::Read
            } else {
                match plan.action(&address) {
                    Some(action) if action.action_type != ActionType::NoOp => action.action_type,
                    _ => continue,
                }
            };
            if failed.contains(&address) {
                continue;
            }

            if let Some(dependency) = graph
                .dependencies_of(&address)
                .into_iter()
                .find(|d| failed.contains(d))
            {
                warn!("Skipping {} because {} failed", address, dependency);
                failed.insert(address.clone());
                result.add_skipped(address);
                continue;
            }

            let outcome = match (action_type, stack.find_data(&address)) {
                (ActionType::Read, Some(block)) => {
                    let config = resolve_attributes(&block.attributes, |r| {
                        lookup_applied(&*state, &data, r)
                    });
                    match self.read_data(&address, &block.data_type, config).await {
                        Ok(attributes) => {
                            data.insert(address.clone(), Value::Object(attributes));
                            Ok(())
                        }
                        Err(e) => Err(e),
                    }
                }
                _ => match stack.find_resource(&address) {
                    Some(block) => {
                        let dependencies = graph.dependencies_of(&address);
                        let outcome = self
                            .apply_resource(block, action_type, dependencies, state, &data)
                            .await;
                        store.save(state).await?;
                        outcome
                    }
                    None => continue,
                },
            };

            match outcome {
                Ok(()) => {
                    info!("{}: {} complete", address, action_type);
                    result.add_success(address, action_type, format!("{} complete", action_type));
                }
                Err(e) => {
                    warn!("{}: {} failed: {}", address, action_type, e);
                    result.add_failure(address.clone(), action_type, e.to_string());
                    failed.insert(address);
                }
            }
        }

        state.outputs = evaluate_outputs(stack, state, &data);
        store.save(state).await?;

        result.duration_ms = started.elapsed().as_millis() as u64;
        Ok(result)
    }

    /// Execute a plan produced by [`Engine::plan_destroy`]
    pub async fn destroy(
        &self,
        stack: Option<&Stack>,
        plan: &Plan,
        state: &mut GlobalState,
        store: &StateManager,
    ) -> Result<ApplyResult> {
        let started = Instant::now();
        let mut result = ApplyResult::new();
        let mut failed = BTreeSet::new();

        self.execute_deletes(stack, plan, state, store, &mut result, &mut failed)
            .await?;

        if state.resources.is_empty() {
            state.outputs.clear();
        }
        store.save(state).await?;

        result.duration_ms = started.elapsed().as_millis() as u64;
        Ok(result)
    }

    /// Bind an existing remote object to a configured address
    pub async fn import(
        &self,
        stack: &Stack,
        state: &mut GlobalState,
        address: &str,
        id: &str,
    ) -> Result<()> {
        let block = stack.find_resource(address).ok_or_else(|| {
            CloudError::InvalidConfig(format!("{} is not defined in the configuration", address))
        })?;
        if state.get_resource(address).is_some() {
            return Err(CloudError::ResourceAlreadyExists(address.to_string()));
        }

        let resource = self.resource_impl(&block.resource_type)?;
        let resolved = resolve_attributes(&block.attributes, |r| {
            lookup_applied(&*state, &BTreeMap::new(), r)
        });
        let known: Attributes = resolved
            .into_iter()
            .filter(|(_, v)| !contains_unknown(v))
            .collect();

        // Configuration only fills gaps; everything read back wins.
        let mut data = ResourceData::from_state(address, id, resource.schema().normalize(&known))
            .with_timeouts(timeouts_for(Some(block), resource.as_ref()));

        info!("Importing {} as {}", id, address);
        resource.import(id, &mut data).await?;
        let id = data.require_id()?.to_string();

        let dependencies = stack.dependency_graph()?.dependencies_of(address);
        state.set_resource(
            address.to_string(),
            ResourceState::new(id, &block.resource_type, block.provider_name())
                .with_attributes(data.into_attributes())
                .with_dependencies(dependencies),
        );
        Ok(())
    }

    async fn read_data(
        &self,
        address: &str,
        data_type: &str,
        config: Attributes,
    ) -> Result<Attributes> {
        let data_source = self.data_source_impl(data_type)?;
        let mut data = ResourceData::new(address, data_source.schema().normalize(&config));

        debug!("Reading {}", address);
        data_source.read(&mut data).await?;
        Ok(data.into_attributes())
    }

    async fn apply_resource(
        &self,
        block: &ResourceBlock,
        action_type: ActionType,
        dependencies: Vec<String>,
        state: &mut GlobalState,
        data: &BTreeMap<String, Value>,
    ) -> Result<()> {
        let address = block.address();
        let resource = self.resource_impl(&block.resource_type)?;
        let schema = resource.schema();
        let timeouts = timeouts_for(Some(block), resource.as_ref());

        let config = schema.normalize(&resolve_attributes(&block.attributes, |r| {
            lookup_applied(&*state, data, r)
        }));
        if contains_unknown(&Value::Object(config.clone())) {
            return Err(CloudError::InvalidConfig(format!(
                "{} still has unresolved references",
                address
            )));
        }

        match action_type {
            // The old instance of a replacement is gone by now
            ActionType::Create | ActionType::Replace => {
                create_resource(resource.as_ref(), block, config, timeouts, dependencies, state)
                    .await
            }
            ActionType::Update => {
                let prior = state.get_resource(&address).cloned().ok_or_else(|| {
                    CloudError::StateError(format!("{} is not in state", address))
                })?;
                let changed: Vec<String> = schema
                    .diff(&config, &prior.attributes)
                    .into_iter()
                    .map(|c| c.attribute)
                    .collect();

                let mut data = ResourceData::from_state(&address, &prior.id, prior.attributes)
                    .with_config(config)
                    .with_changes(changed)
                    .with_timeouts(timeouts);

                info!("Updating {}", address);
                resource.update(&mut data).await?;

                if let Some(entry) = state.get_resource_mut(&address) {
                    entry.update_attributes(data.into_attributes());
                    entry.dependencies = dependencies;
                }
                Ok(())
            }
            ActionType::Delete | ActionType::Read | ActionType::NoOp => Ok(()),
        }
    }

    /// Destroy deleted resources and the old instances of replaced ones
    ///
    /// Runs in reverse dependency order so dependents go before the objects
    /// they reference. A replaced address whose old instance could not be
    /// destroyed is marked failed and its create is skipped.
    async fn execute_deletes(
        &self,
        stack: Option<&Stack>,
        plan: &Plan,
        state: &mut GlobalState,
        store: &StateManager,
        result: &mut ApplyResult,
        failed: &mut BTreeSet<String>,
    ) -> Result<()> {
        let targets: BTreeMap<String, ActionType> = plan
            .actions
            .iter()
            .filter(|a| matches!(a.action_type, ActionType::Delete | ActionType::Replace))
            .map(|a| (a.address.clone(), a.action_type))
            .collect();
        if targets.is_empty() {
            return Ok(());
        }

        let graph = state.dependency_graph()?;

        for address in graph.reverse_topological_order()? {
            let Some(&action_type) = targets.get(&address) else {
                continue;
            };

            if let Some(dependent) = graph
                .dependents_of(&address)
                .into_iter()
                .find(|d| failed.contains(d))
            {
                warn!("Keeping {} because {} could not be destroyed", address, dependent);
                failed.insert(address.clone());
                result.add_skipped(address);
                continue;
            }

            let Some(prior) = state.get_resource(&address).cloned() else {
                continue;
            };

            let outcome = match self.resource_impl(&prior.resource_type) {
                Ok(resource) => {
                    let block = stack.and_then(|s| s.find_resource(&address));
                    let timeouts = timeouts_for(block, resource.as_ref());
                    delete_resource(resource.as_ref(), &address, &prior, timeouts).await
                }
                Err(e) => Err(e),
            };

            match outcome {
                Ok(()) => {
                    state.remove_resource(&address);
                    store.save(state).await?;
                    if action_type == ActionType::Delete {
                        info!("{}: destroyed", address);
                        result.add_success(address, ActionType::Delete, "destroyed".into());
                    } else {
                        info!("{}: old instance {} destroyed", address, prior.id);
                    }
                }
                Err(e) => {
                    warn!("{}: destroy failed: {}", address, e);
                    result.add_failure(address.clone(), action_type, e.to_string());
                    failed.insert(address);
                }
            }
        }

        Ok(())
    }
}

/// Decide the action for one resource and the values other blocks will see
fn plan_resource(
    block: &ResourceBlock,
    schema: &Schema,
    config: Attributes,
    prior: Option<&ResourceState>,
) -> (Action, Value) {
    let address = block.address();
    let resource_type = block.resource_type.as_str();

    let Some(prior) = prior else {
        let changes = schema.diff(&config, &Attributes::new());
        let action = Action::new(address, ActionType::Create, resource_type).with_changes(changes);
        return (action, Value::Object(config));
    };

    let changes = schema.diff(&config, &prior.attributes);

    if prior.status == ResourceStatus::Tainted {
        let action = Action::new(address, ActionType::Replace, resource_type)
            .with_id(&prior.id)
            .with_changes(changes)
            .with_reason("tainted by an incomplete apply");
        return (action, Value::Object(config));
    }

    let forcing: Vec<&str> = changes
        .iter()
        .filter(|c| c.force_new)
        .map(|c| c.attribute.as_str())
        .collect();

    if !forcing.is_empty() {
        let reason = format!("{} forces replacement", forcing.join(", "));
        let action = Action::new(address, ActionType::Replace, resource_type)
            .with_id(&prior.id)
            .with_changes(changes)
            .with_reason(reason);
        return (action, Value::Object(config));
    }

    let mut planned = prior.attributes.clone();
    planned.insert("id".to_string(), Value::String(prior.id.clone()));

    if changes.is_empty() {
        let action = Action::new(address, ActionType::NoOp, resource_type).with_id(&prior.id);
        return (action, Value::Object(planned));
    }

    planned.extend(config);
    let action = Action::new(address, ActionType::Update, resource_type)
        .with_id(&prior.id)
        .with_changes(changes);
    (action, Value::Object(planned))
}

async fn create_resource(
    resource: &dyn Resource,
    block: &ResourceBlock,
    config: Attributes,
    timeouts: Timeouts,
    dependencies: Vec<String>,
    state: &mut GlobalState,
) -> Result<()> {
    let address = block.address();
    info!("Creating {}", address);

    let mut data = ResourceData::new(&address, config).with_timeouts(timeouts);
    let outcome = resource.create(&mut data).await;

    let Some(id) = data.id().map(str::to_string) else {
        return outcome.and(Err(CloudError::StateError(format!(
            "{} was created without an ID",
            address
        ))));
    };

    // Created remotely but not confirmed: remember it so the next apply replaces it
    let status = match &outcome {
        Ok(()) => ResourceStatus::Ready,
        Err(_) => ResourceStatus::Tainted,
    };

    state.set_resource(
        address,
        ResourceState::new(id, &block.resource_type, block.provider_name())
            .with_status(status)
            .with_attributes(data.into_attributes())
            .with_dependencies(dependencies),
    );
    outcome
}

async fn delete_resource(
    resource: &dyn Resource,
    address: &str,
    prior: &ResourceState,
    timeouts: Timeouts,
) -> Result<()> {
    info!("Destroying {} ({})", address, prior.id);
    let mut data = ResourceData::from_state(address, &prior.id, prior.attributes.clone())
        .with_timeouts(timeouts);

    match resource.delete(&mut data).await {
        Err(e) if e.is_not_found() => {
            debug!("{} was already gone", address);
            Ok(())
        }
        other => other,
    }
}

fn timeouts_for(block: Option<&ResourceBlock>, resource: &dyn Resource) -> Timeouts {
    block
        .map(|b| b.timeouts)
        .unwrap_or_default()
        .or(resource.default_timeouts())
}

fn resolve_attributes<F>(attributes: &Attributes, lookup: F) -> Attributes
where
    F: Fn(&Reference) -> Option<Value>,
{
    match resolve_references(&Value::Object(attributes.clone()), &lookup) {
        Value::Object(map) => map,
        _ => Attributes::new(),
    }
}

fn lookup_in(known: &BTreeMap<String, Value>, reference: &Reference) -> Option<Value> {
    known
        .get(&reference.address)
        .and_then(|value| reference.lookup(value))
        .cloned()
}

/// Lookup against applied state (resources) and data source results
fn lookup_applied(
    state: &GlobalState,
    data: &BTreeMap<String, Value>,
    reference: &Reference,
) -> Option<Value> {
    if reference.address.starts_with(DATA_PREFIX) {
        lookup_in(data, reference)
    } else {
        state
            .attributes_of(&reference.address)
            .and_then(|value| reference.lookup(&value).cloned())
    }
}

/// Resolve outputs against the applied state
pub fn evaluate_outputs(
    stack: &Stack,
    state: &GlobalState,
    data: &BTreeMap<String, Value>,
) -> BTreeMap<String, OutputState> {
    let mut outputs = BTreeMap::new();

    for output in &stack.outputs {
        let value = resolve_references(&output.value, &|r: &Reference| {
            lookup_applied(state, data, r)
        });
        if contains_unknown(&value) {
            warn!("Output '{}' could not be resolved", output.name);
            continue;
        }
        outputs.insert(
            output.name.clone(),
            OutputState {
                value,
                sensitive: output.sensitive,
            },
        );
    }

    outputs
}
