//! [`Lookup`] implementations backed by the resource schemas

use super::Lookup;
use crate::client::CivoClient;
use crate::models::{DnsDomain, Firewall, FirewallRule, Instance, Network, ObjectStore, Volume};
use crate::resources::dns_domain::{dns_domain_schema, flatten_dns_domain};
use crate::resources::firewall::{firewall_schema, flatten_firewall, rules_path};
use crate::resources::instance::{flatten_instance, instance_schema};
use crate::resources::network::{flatten_network, network_schema};
use crate::resources::object_store::{flatten_object_store, object_store_schema};
use crate::resources::volume::{flatten_volume, volume_schema};
use async_trait::async_trait;
use stratoflow_cloud::{ResourceData, Result, Schema};

pub struct InstanceLookup;

#[async_trait]
impl Lookup for InstanceLookup {
    type Item = Instance;

    fn type_name(&self) -> &'static str {
        "civo_instance"
    }

    fn collection(&self) -> &'static str {
        "instances"
    }

    fn name_attribute(&self) -> &'static str {
        "hostname"
    }

    fn resource_schema(&self) -> Schema {
        instance_schema()
    }

    fn paginated(&self) -> bool {
        true
    }

    fn id_of<'a>(&self, item: &'a Instance) -> &'a str {
        &item.id
    }

    fn name_of<'a>(&self, item: &'a Instance) -> &'a str {
        &item.hostname
    }

    async fn flatten(&self, client: &CivoClient, data: &mut ResourceData, item: &Instance) -> Result<()> {
        flatten_instance(data, item, client.region());
        Ok(())
    }
}

pub struct NetworkLookup;

#[async_trait]
impl Lookup for NetworkLookup {
    type Item = Network;

    fn type_name(&self) -> &'static str {
        "civo_network"
    }

    fn collection(&self) -> &'static str {
        "networks"
    }

    fn name_attribute(&self) -> &'static str {
        "label"
    }

    fn resource_schema(&self) -> Schema {
        network_schema()
    }

    fn id_of<'a>(&self, item: &'a Network) -> &'a str {
        &item.id
    }

    fn name_of<'a>(&self, item: &'a Network) -> &'a str {
        &item.label
    }

    async fn flatten(&self, client: &CivoClient, data: &mut ResourceData, item: &Network) -> Result<()> {
        flatten_network(data, item, client.region());
        Ok(())
    }
}

pub struct VolumeLookup;

#[async_trait]
impl Lookup for VolumeLookup {
    type Item = Volume;

    fn type_name(&self) -> &'static str {
        "civo_volume"
    }

    fn collection(&self) -> &'static str {
        "volumes"
    }

    fn name_attribute(&self) -> &'static str {
        "name"
    }

    fn resource_schema(&self) -> Schema {
        volume_schema()
    }

    fn id_of<'a>(&self, item: &'a Volume) -> &'a str {
        &item.id
    }

    fn name_of<'a>(&self, item: &'a Volume) -> &'a str {
        &item.name
    }

    async fn flatten(&self, client: &CivoClient, data: &mut ResourceData, item: &Volume) -> Result<()> {
        flatten_volume(data, item, client.region());
        Ok(())
    }
}

pub struct FirewallLookup;

#[async_trait]
impl Lookup for FirewallLookup {
    type Item = Firewall;

    fn type_name(&self) -> &'static str {
        "civo_firewall"
    }

    fn collection(&self) -> &'static str {
        "firewalls"
    }

    fn name_attribute(&self) -> &'static str {
        "name"
    }

    fn resource_schema(&self) -> Schema {
        firewall_schema()
    }

    fn id_of<'a>(&self, item: &'a Firewall) -> &'a str {
        &item.id
    }

    fn name_of<'a>(&self, item: &'a Firewall) -> &'a str {
        &item.name
    }

    async fn flatten(&self, client: &CivoClient, data: &mut ResourceData, item: &Firewall) -> Result<()> {
        let rules: Vec<FirewallRule> = client.get(&rules_path(&item.id)).await?;
        flatten_firewall(data, item, &rules, client.region());
        Ok(())
    }
}

pub struct DnsDomainLookup;

#[async_trait]
impl Lookup for DnsDomainLookup {
    type Item = DnsDomain;

    fn type_name(&self) -> &'static str {
        "civo_dns_domain_name"
    }

    fn collection(&self) -> &'static str {
        "dns"
    }

    fn name_attribute(&self) -> &'static str {
        "name"
    }

    fn resource_schema(&self) -> Schema {
        dns_domain_schema()
    }

    fn id_of<'a>(&self, item: &'a DnsDomain) -> &'a str {
        &item.id
    }

    fn name_of<'a>(&self, item: &'a DnsDomain) -> &'a str {
        &item.name
    }

    async fn flatten(&self, _client: &CivoClient, data: &mut ResourceData, item: &DnsDomain) -> Result<()> {
        flatten_dns_domain(data, item);
        Ok(())
    }
}

pub struct ObjectStoreLookup;

#[async_trait]
impl Lookup for ObjectStoreLookup {
    type Item = ObjectStore;

    fn type_name(&self) -> &'static str {
        "civo_object_store"
    }

    fn collection(&self) -> &'static str {
        "objectstores"
    }

    fn name_attribute(&self) -> &'static str {
        "name"
    }

    fn resource_schema(&self) -> Schema {
        object_store_schema()
    }

    fn paginated(&self) -> bool {
        true
    }

    fn id_of<'a>(&self, item: &'a ObjectStore) -> &'a str {
        &item.id
    }

    fn name_of<'a>(&self, item: &'a ObjectStore) -> &'a str {
        &item.name
    }

    async fn flatten(&self, client: &CivoClient, data: &mut ResourceData, item: &ObjectStore) -> Result<()> {
        flatten_object_store(data, item, client.region());
        Ok(())
    }
}
