//! Builds the viewer's graph from Kubernetes NetworkPolicy manifests.
//!
//! Every distinct pod selector (namespace plus match labels) becomes a
//! service. A policy's egress peers become links from the selected pods.
//! Services in each namespace share a group, numbered in first-seen order.

use std::collections::{BTreeMap, HashMap};

use log::{debug, warn};
use serde::Deserialize;

use crate::components::network_graph::{GraphData, LinkData, NodeData};
use crate::error::{GraphError, GraphResult};

/// Pod or namespace labels, kept sorted so equal selectors get equal ids.
pub type Labels = BTreeMap<String, String>;

/// Labels that name a service, by priority.
const NAME_LABELS: [&str; 3] = [
	"component",
	"kubernetes.io/metadata.name",
	"app.kubernetes.io/name",
];
const HIDDEN_NAMESPACES: [&str; 1] = ["observability"];
const HIDDEN_LABEL: &str = "k8s-app";
const DEFAULT_NAMESPACE: &str = "default";

/// Group of services whose selector spans every namespace.
pub const UNSCOPED_GROUP: i64 = 0;

/// The first naming label present, if any.
pub fn name_from_labels(labels: &Labels) -> Option<&str> {
	NAME_LABELS
		.iter()
		.find_map(|key| labels.get(*key))
		.map(String::as_str)
}

/// `namespace/key=value,...`, with `*` standing for any namespace.
pub fn selector_id(namespace: Option<&str>, labels: &Labels) -> String {
	let pairs: Vec<String> = labels.iter().map(|(k, v)| format!("{k}={v}")).collect();
	format!("{}/{}", namespace.unwrap_or("*"), pairs.join(","))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Manifest {
	kind: Option<String>,
	api_version: Option<String>,
	metadata: Option<Metadata>,
	spec: Option<PolicySpec>,
}

#[derive(Debug, Default, Deserialize)]
struct Metadata {
	namespace: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PolicySpec {
	pod_selector: Option<Selector>,
	ingress: Option<Vec<IngressRule>>,
	egress: Option<Vec<EgressRule>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Selector {
	match_labels: Option<Labels>,
}

#[derive(Debug, Default, Deserialize)]
struct IngressRule {
	from: Option<Vec<Peer>>,
}

#[derive(Debug, Default, Deserialize)]
struct EgressRule {
	to: Option<Vec<Peer>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Peer {
	pod_selector: Option<Selector>,
	namespace_selector: Option<Selector>,
	ip_block: Option<serde_yaml::Value>,
}

impl Selector {
	fn labels(&self) -> Labels {
		self.match_labels.clone().unwrap_or_default()
	}
}

impl Manifest {
	/// The policy's namespace and spec, or `None` if this is not a
	/// Kubernetes resource.
	fn policy(&self) -> Option<(&str, &PolicySpec)> {
		self.kind.as_ref()?;
		self.api_version.as_ref()?;
		let namespace = self
			.metadata
			.as_ref()?
			.namespace
			.as_deref()
			.unwrap_or(DEFAULT_NAMESPACE);
		Some((namespace, self.spec.as_ref()?))
	}
}

impl Peer {
	/// Without a namespace selector the peer lives in the policy's own
	/// namespace; an empty selector matches every namespace.
	fn namespace(&self, own: &str) -> Option<String> {
		match &self.namespace_selector {
			None => Some(own.to_owned()),
			Some(selector) => selector
				.match_labels
				.as_ref()
				.and_then(name_from_labels)
				.map(str::to_owned),
		}
	}

	fn labels(&self) -> Labels {
		self.pod_selector
			.as_ref()
			.map(Selector::labels)
			.unwrap_or_default()
	}
}

/// One pod selector seen in the manifests.
#[derive(Clone, Debug, PartialEq)]
pub struct Service {
	pub name: Option<String>,
	pub namespace: Option<String>,
	pub labels: Labels,
	/// Selector ids of the services this one may send traffic to.
	pub egress: Vec<String>,
}

impl Service {
	/// Monitoring and cluster add-ons clutter the picture and are left out.
	pub fn is_hidden(&self) -> bool {
		self.namespace
			.as_deref()
			.is_some_and(|ns| HIDDEN_NAMESPACES.contains(&ns))
			|| self.labels.contains_key(HIDDEN_LABEL)
	}

	fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
		self.name.as_deref().unwrap_or(id)
	}
}

/// Services keyed by selector id, iterated in the order they were first seen.
#[derive(Clone, Debug, Default)]
pub struct ServiceMap {
	order: Vec<String>,
	services: HashMap<String, Service>,
}

impl ServiceMap {
	pub fn len(&self) -> usize {
		self.order.len()
	}

	pub fn is_empty(&self) -> bool {
		self.order.is_empty()
	}

	pub fn get(&self, id: &str) -> Option<&Service> {
		self.services.get(id)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &Service)> {
		self.order
			.iter()
			.filter_map(|id| Some((id.as_str(), self.services.get(id)?)))
	}

	/// Returns the id of the service selected by `namespace` and `labels`,
	/// adding it on first sight.
	fn register(&mut self, namespace: Option<&str>, labels: Labels) -> String {
		let id = selector_id(namespace, &labels);
		if !self.services.contains_key(&id) {
			self.order.push(id.clone());
			self.services.insert(
				id.clone(),
				Service {
					name: name_from_labels(&labels).map(str::to_owned),
					namespace: namespace.map(str::to_owned),
					labels,
					egress: Vec::new(),
				},
			);
		}
		id
	}

	/// Policies selecting the same pods add up; none replaces another.
	fn add_policy(&mut self, namespace: &str, spec: &PolicySpec) {
		let labels = spec
			.pod_selector
			.as_ref()
			.map(Selector::labels)
			.unwrap_or_default();
		let id = self.register(Some(namespace), labels);

		let sources = spec
			.ingress
			.iter()
			.flatten()
			.flat_map(|rule| rule.from.iter().flatten());
		for peer in sources.filter(|peer| peer.ip_block.is_none()) {
			self.register(peer.namespace(namespace).as_deref(), peer.labels());
		}

		let targets = spec
			.egress
			.iter()
			.flatten()
			.flat_map(|rule| rule.to.iter().flatten());
		for peer in targets.filter(|peer| peer.ip_block.is_none()) {
			let target = self.register(peer.namespace(namespace).as_deref(), peer.labels());
			if let Some(service) = self.services.get_mut(&id) {
				service.egress.push(target);
			}
		}
	}
}

/// Reads every NetworkPolicy in a multi-document YAML stream. Documents that
/// are empty or not Kubernetes resources are skipped; malformed YAML fails.
pub fn parse_policies(yaml: &str) -> GraphResult<ServiceMap> {
	let mut services = ServiceMap::default();
	for document in serde_yaml::Deserializer::from_str(yaml) {
		let value = serde_yaml::Value::deserialize(document).map_err(GraphError::Policy)?;
		if value.is_null() {
			continue;
		}
		let manifest: Manifest = match serde_yaml::from_value(value) {
			Ok(manifest) => manifest,
			Err(err) => {
				warn!("skipping unreadable resource: {err}");
				continue;
			}
		};
		match manifest.policy() {
			Some((namespace, spec)) => services.add_policy(namespace, spec),
			None => warn!("not a k8s resource, skipping"),
		}
	}
	debug!("collected {} services", services.len());
	Ok(services)
}

/// Maps services to graph nodes and their egress to links. Namespaces get
/// groups 1, 2, ... in first-seen order; selectors spanning every namespace
/// land in [`UNSCOPED_GROUP`]. Hidden services are dropped along with links
/// to them.
pub fn generate_graph(services: &ServiceMap) -> GraphData {
	let mut groups: HashMap<&str, i64> = HashMap::new();
	let mut graph = GraphData::default();

	for (id, service) in services.iter().filter(|(_, s)| !s.is_hidden()) {
		let name = service.display_name(id);
		let group = match service.namespace.as_deref() {
			Some(ns) if !ns.is_empty() => {
				let next = groups.len() as i64 + 1;
				*groups.entry(ns).or_insert(next)
			}
			_ => UNSCOPED_GROUP,
		};
		graph.nodes.push(NodeData::new(name, group));

		for target_id in &service.egress {
			let Some(target) = services.get(target_id) else {
				continue;
			};
			if !target.is_hidden() {
				graph
					.links
					.push(LinkData::new(name, target.display_name(target_id), 1.0));
			}
		}
	}
	graph
}

/// [`parse_policies`] then [`generate_graph`].
pub fn graph_from_policies(yaml: &str) -> GraphResult<GraphData> {
	parse_policies(yaml).map(|services| generate_graph(&services))
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	const POLICIES: &str = r#"
apiVersion: networking.k8s.io/v1
kind: NetworkPolicy
metadata:
  name: frontend
  namespace: shop
spec:
  podSelector:
    matchLabels:
      app.kubernetes.io/name: frontend
  ingress:
    - from:
        - namespaceSelector:
            matchLabels:
              kubernetes.io/metadata.name: edge
          podSelector:
            matchLabels:
              component: gateway
  egress:
    - to:
        - podSelector:
            matchLabels:
              app.kubernetes.io/name: catalog
    - to:
        - ipBlock:
            cidr: 10.0.0.0/8
    - to:
        - namespaceSelector:
            matchLabels:
              kubernetes.io/metadata.name: observability
          podSelector:
            matchLabels:
              app.kubernetes.io/name: tempo
        - namespaceSelector:
            matchLabels:
              kubernetes.io/metadata.name: kube-system
          podSelector:
            matchLabels:
              k8s-app: kube-dns
---
apiVersion: networking.k8s.io/v1
kind: NetworkPolicy
metadata:
  name: payments
  namespace: billing
spec:
  podSelector:
    matchLabels:
      component: payments
  egress:
    - to:
        - namespaceSelector: {}
          podSelector:
            matchLabels:
              component: vault
---
kind: ConfigMap
data: {}
---
"#;

	fn labels(pairs: &[(&str, &str)]) -> Labels {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect()
	}

	#[test]
	fn selector_ids_sort_labels_and_star_any_namespace() {
		let l = labels(&[("tier", "db"), ("app", "pg")]);
		assert_eq!(selector_id(Some("data"), &l), "data/app=pg,tier=db");
		assert_eq!(selector_id(None, &l), "*/app=pg,tier=db");
		assert_eq!(selector_id(Some("data"), &Labels::new()), "data/");
	}

	#[test]
	fn name_labels_follow_priority() {
		let l = labels(&[("app.kubernetes.io/name", "api"), ("component", "api-server")]);
		assert_eq!(name_from_labels(&l), Some("api-server"));
		assert_eq!(name_from_labels(&labels(&[("tier", "db")])), None);
	}

	#[test]
	fn services_are_collected_in_first_seen_order() {
		let services = parse_policies(POLICIES).unwrap();
		let ids: Vec<_> = services.iter().map(|(id, _)| id).collect();
		assert_eq!(
			ids,
			vec![
				"shop/app.kubernetes.io/name=frontend",
				"edge/component=gateway",
				"shop/app.kubernetes.io/name=catalog",
				"observability/app.kubernetes.io/name=tempo",
				"kube-system/k8s-app=kube-dns",
				"billing/component=payments",
				"*/component=vault",
			]
		);
		let frontend = services.get(ids[0]).unwrap();
		assert_eq!(frontend.egress.len(), 3);
	}

	#[test]
	fn graph_numbers_namespaces_and_drops_hidden_services() {
		let graph = graph_from_policies(POLICIES).unwrap();
		assert_eq!(
			graph.nodes,
			vec![
				NodeData::new("frontend", 1),
				NodeData::new("gateway", 2),
				NodeData::new("catalog", 1),
				NodeData::new("payments", 3),
				NodeData::new("vault", UNSCOPED_GROUP),
			]
		);
		assert_eq!(
			graph.links,
			vec![
				LinkData::new("frontend", "catalog", 1.0),
				LinkData::new("payments", "vault", 1.0),
			]
		);
	}

	#[test]
	fn unnamed_services_use_their_selector_id() {
		let yaml = r#"
apiVersion: networking.k8s.io/v1
kind: NetworkPolicy
metadata:
  name: db
spec:
  podSelector:
    matchLabels:
      tier: db
  egress:
    - to:
        - podSelector: {}
"#;
		let graph = graph_from_policies(yaml).unwrap();
		let ids: Vec<_> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
		assert_eq!(ids, vec!["default/tier=db", "default/"]);
		assert_eq!(graph.links, vec![LinkData::new("default/tier=db", "default/", 1.0)]);
	}

	#[test]
	fn policies_on_the_same_pods_accumulate() {
		let yaml = r#"
apiVersion: networking.k8s.io/v1
kind: NetworkPolicy
metadata: { namespace: shop }
spec:
  podSelector: { matchLabels: { component: cart } }
  egress: [ { to: [ { podSelector: { matchLabels: { component: redis } } } ] } ]
---
apiVersion: networking.k8s.io/v1
kind: NetworkPolicy
metadata: { namespace: shop }
spec:
  podSelector: { matchLabels: { component: cart } }
  egress: [ { to: [ { podSelector: { matchLabels: { component: checkout } } } ] } ]
"#;
		let graph = graph_from_policies(yaml).unwrap();
		assert_eq!(graph.nodes.len(), 3);
		assert_eq!(
			graph.links,
			vec![
				LinkData::new("cart", "redis", 1.0),
				LinkData::new("cart", "checkout", 1.0),
			]
		);
	}

	#[test]
	fn non_resources_and_empty_input_give_an_empty_graph() {
		assert!(parse_policies("").unwrap().is_empty());
		assert!(parse_policies("kind: ConfigMap\ndata: {}\n").unwrap().is_empty());
		assert!(parse_policies("- 1\n- 2\n").unwrap().is_empty());
	}

	#[test]
	fn malformed_yaml_is_an_error() {
		let err = parse_policies("spec: [1, 2").unwrap_err();
		assert!(matches!(err, GraphError::Policy(_)));
	}

	#[test]
	fn generated_graph_loads_back_as_viewer_data() {
		let graph = graph_from_policies(POLICIES).unwrap();
		let json = graph.to_json().unwrap();
		assert_eq!(GraphData::from_json(&json).unwrap(), graph);
		assert!(!json.contains("\"x\""));
	}
}
