//! Structural consistency rules
//!
//! Checks that go beyond field presence. Each rule is a plain function of one
//! resource; rules never see each other's output, so the table can grow
//! without touching existing entries.

use kubexplain_core::{FieldPath, Resource, Scalar, TreeNode};

use crate::rules::RuleSet;
use crate::suggestions::{did_you_mean, find_closest_matches};
use crate::validate::{Issue, Severity};

/// A named consistency check; `check` receives `id` to stamp on its issues
pub struct ConsistencyRule {
    pub id: &'static str,
    pub check: fn(&'static str, &Resource, &RuleSet) -> Vec<Issue>,
}

impl ConsistencyRule {
    pub fn run(&self, resource: &Resource, rules: &RuleSet) -> Vec<Issue> {
        (self.check)(self.id, resource, rules)
    }
}

/// Every consistency rule, in evaluation order
pub const CONSISTENCY_RULES: &[ConsistencyRule] = &[
    ConsistencyRule {
        id: "unknown-kind",
        check: unknown_kind,
    },
    ConsistencyRule {
        id: "service-loadbalancer-without-ports",
        check: loadbalancer_without_ports,
    },
    ConsistencyRule {
        id: "service-without-ports",
        check: service_without_ports,
    },
    ConsistencyRule {
        id: "service-without-selector",
        check: service_without_selector,
    },
    ConsistencyRule {
        id: "invalid-service-port",
        check: invalid_service_ports,
    },
    ConsistencyRule {
        id: "selector-label-mismatch",
        check: selector_label_mismatch,
    },
    ConsistencyRule {
        id: "pod-without-containers",
        check: pod_without_containers,
    },
    ConsistencyRule {
        id: "container-missing-name",
        check: container_missing_name,
    },
    ConsistencyRule {
        id: "container-missing-image",
        check: container_missing_image,
    },
    ConsistencyRule {
        id: "container-without-resources",
        check: container_without_resources,
    },
    ConsistencyRule {
        id: "image-latest-tag",
        check: image_latest_tag,
    },
    ConsistencyRule {
        id: "invalid-container-port",
        check: invalid_container_ports,
    },
    ConsistencyRule {
        id: "ingress-without-rules",
        check: ingress_without_rules,
    },
];

const WORKLOAD_KINDS: &[&str] = &["Deployment", "StatefulSet", "DaemonSet", "ReplicaSet"];

fn dotted(path: &str) -> FieldPath {
    path.split('.').fold(FieldPath::root(), |p, key| p.key(key))
}

fn is_blank(node: Option<&TreeNode>) -> bool {
    node.is_none_or(|n| n.is_null() || n.is_empty())
}

/// Where a kind keeps its pod spec: (path that must exist, pod spec path)
fn pod_spec_location(kind: &str) -> Option<(&'static str, &'static str)> {
    match kind {
        "Pod" => Some(("spec", "spec")),
        "Deployment" | "StatefulSet" | "DaemonSet" | "ReplicaSet" | "Job" => {
            Some(("spec.template", "spec.template.spec"))
        }
        "CronJob" => Some(("spec.jobTemplate", "spec.jobTemplate.spec.template.spec")),
        _ => None,
    }
}

/// The pod spec of a resource and its path, when its anchor exists
fn pod_spec(resource: &Resource) -> Option<(FieldPath, Option<&TreeNode>)> {
    let (anchor, spec) = pod_spec_location(&resource.kind)?;
    let anchor = resource.content.get_path(anchor)?;
    if anchor.is_null() {
        return None;
    }
    Some((dotted(spec), resource.content.get_path(spec)))
}

/// A container entry of a pod spec
struct Container<'a> {
    path: FieldPath,
    index: usize,
    node: &'a TreeNode,
}

impl Container<'_> {
    fn name(&self) -> Option<&str> {
        self.node.get("name").and_then(TreeNode::as_str)
    }

    fn label(&self) -> String {
        match self.name() {
            Some(name) => format!("'{}'", name),
            None => format!("at index {}", self.index),
        }
    }
}

/// `containers` then `initContainers` of the resource's pod spec
fn containers(resource: &Resource) -> Vec<Container<'_>> {
    let Some((spec_path, Some(spec))) = pod_spec(resource) else {
        return Vec::new();
    };

    ["containers", "initContainers"]
        .into_iter()
        .filter_map(|list| {
            let items = spec.get(list)?.as_sequence()?;
            let list_path = spec_path.key(list);
            Some(items.iter().enumerate().map(move |(index, node)| Container {
                path: list_path.index(index),
                index,
                node,
            }))
        })
        .flatten()
        .collect()
}

fn service_type(resource: &Resource) -> &str {
    resource
        .content
        .get_path("spec.type")
        .and_then(TreeNode::as_str)
        .unwrap_or("ClusterIP")
}

fn service_spec(resource: &Resource) -> Option<&TreeNode> {
    if resource.kind != "Service" {
        return None;
    }
    resource.content.get("spec").filter(|s| !s.is_null())
}

fn unknown_kind(id: &'static str, resource: &Resource, rules: &RuleSet) -> Vec<Issue> {
    if rules.describe_kind(&resource.kind).is_some() {
        return Vec::new();
    }
    let matches = find_closest_matches(&resource.kind, rules.known_kinds(), 3);
    let Some(hint) = did_you_mean(&matches) else {
        return Vec::new();
    };
    vec![
        Issue::new(
            Severity::Info,
            id,
            resource,
            "kind",
            format!("Unknown kind '{}'", resource.kind),
        )
        .with_suggestion(hint),
    ]
}

fn loadbalancer_without_ports(id: &'static str, resource: &Resource, _: &RuleSet) -> Vec<Issue> {
    match service_spec(resource) {
        Some(spec) if service_type(resource) == "LoadBalancer" && is_blank(spec.get("ports")) => {
            vec![
                Issue::new(
                    Severity::Warning,
                    id,
                    resource,
                    "spec.ports",
                    format!(
                        "LoadBalancer Service '{}' exposes no ports",
                        resource.name.as_deref().unwrap_or("unnamed")
                    ),
                )
                .with_suggestion("Add at least one port in spec.ports"),
            ]
        }
        _ => Vec::new(),
    }
}

fn service_without_ports(id: &'static str, resource: &Resource, _: &RuleSet) -> Vec<Issue> {
    let Some(spec) = service_spec(resource) else {
        return Vec::new();
    };
    if matches!(service_type(resource), "LoadBalancer" | "ExternalName")
        || !is_blank(spec.get("ports"))
    {
        return Vec::new();
    }
    vec![
        Issue::new(
            Severity::Error,
            id,
            resource,
            "spec.ports",
            format!(
                "Service '{}' has no ports defined",
                resource.name.as_deref().unwrap_or("unnamed")
            ),
        )
        .with_suggestion("Add at least one port in spec.ports"),
    ]
}

fn service_without_selector(id: &'static str, resource: &Resource, _: &RuleSet) -> Vec<Issue> {
    let Some(spec) = service_spec(resource) else {
        return Vec::new();
    };
    if service_type(resource) == "ExternalName" || !is_blank(spec.get("selector")) {
        return Vec::new();
    }
    vec![
        Issue::new(
            Severity::Warning,
            id,
            resource,
            "spec.selector",
            format!(
                "Service '{}' missing selector",
                resource.name.as_deref().unwrap_or("unnamed")
            ),
        )
        .with_suggestion("Add spec.selector to route traffic to matching pods"),
    ]
}

/// Problem with a port value, if any
fn port_problem(node: &TreeNode, allow_name: bool) -> Option<String> {
    match node.as_scalar()? {
        Scalar::Int(port) if (1..=65535).contains(port) => None,
        Scalar::Int(port) => Some(format!("port {} is outside 1-65535", port)),
        Scalar::String(name) if allow_name && !name.trim().is_empty() => None,
        other => Some(format!("port must be an integer, found {}", other.type_name())),
    }
}

fn check_ports(
    resource: &Resource,
    rule: &'static str,
    base: &FieldPath,
    ports: &TreeNode,
    fields: &[(&str, bool)],
) -> Vec<Issue> {
    let Some(items) = ports.as_sequence() else {
        return Vec::new();
    };
    let mut issues = Vec::new();
    for (index, port) in items.iter().enumerate() {
        for (field, allow_name) in fields {
            let Some(value) = port.get(field) else {
                continue;
            };
            if let Some(problem) = port_problem(value, *allow_name) {
                let path = base.index(index).key(*field);
                issues.push(
                    Issue::new(
                        Severity::Error,
                        rule,
                        resource,
                        path.to_string(),
                        format!("Invalid {}: {}", field, problem),
                    )
                    .with_suggestion("Use a port number between 1 and 65535"),
                );
            }
        }
    }
    issues
}

fn invalid_service_ports(id: &'static str, resource: &Resource, _: &RuleSet) -> Vec<Issue> {
    let Some(ports) = service_spec(resource).and_then(|s| s.get("ports")) else {
        return Vec::new();
    };
    check_ports(
        resource,
        id,
        &dotted("spec.ports"),
        ports,
        &[("port", false), ("targetPort", true), ("nodePort", false)],
    )
}

fn invalid_container_ports(id: &'static str, resource: &Resource, _: &RuleSet) -> Vec<Issue> {
    containers(resource)
        .iter()
        .filter_map(|c| Some((c.path.key("ports"), c.node.get("ports")?)))
        .flat_map(|(path, ports)| {
            check_ports(
                resource,
                id,
                &path,
                ports,
                &[("containerPort", false), ("hostPort", false)],
            )
        })
        .collect()
}

fn selector_label_mismatch(id: &'static str, resource: &Resource, _: &RuleSet) -> Vec<Issue> {
    if !WORKLOAD_KINDS.contains(&resource.kind.as_str()) {
        return Vec::new();
    }
    let content = &resource.content;
    let (Some(selector), Some(template)) = (
        content.get_path("spec.selector.matchLabels").and_then(TreeNode::as_mapping),
        content.get_path("spec.template.metadata.labels"),
    ) else {
        return Vec::new();
    };

    let base = dotted("spec.selector.matchLabels");
    selector
        .iter()
        .filter(|(key, value)| template.get(key) != Some(*value))
        .map(|(key, _)| {
            Issue::new(
                Severity::Warning,
                id,
                resource,
                base.key(key.as_str()).to_string(),
                format!("Selector label '{}' doesn't match template labels", key),
            )
            .with_suggestion("Ensure selector.matchLabels match template.metadata.labels")
        })
        .collect()
}

fn pod_without_containers(id: &'static str, resource: &Resource, _: &RuleSet) -> Vec<Issue> {
    let Some((spec_path, spec)) = pod_spec(resource) else {
        return Vec::new();
    };
    if !is_blank(spec.and_then(|s| s.get("containers"))) {
        return Vec::new();
    }
    let path = spec_path.key("containers").to_string();
    vec![
        Issue::new(
            Severity::Error,
            id,
            resource,
            path.clone(),
            format!(
                "{} '{}' has no containers defined",
                resource.kind,
                resource.name.as_deref().unwrap_or("unnamed")
            ),
        )
        .with_suggestion(format!("Add at least one container in {}", path)),
    ]
}

fn container_missing_name(id: &'static str, resource: &Resource, _: &RuleSet) -> Vec<Issue> {
    containers(resource)
        .iter()
        .filter(|c| c.name().is_none_or(|n| n.trim().is_empty()))
        .map(|c| {
            Issue::new(
                Severity::Error,
                id,
                resource,
                c.path.key("name").to_string(),
                format!("Container at index {} missing name", c.index),
            )
            .with_suggestion("Every container must have a unique name")
        })
        .collect()
}

fn container_missing_image(id: &'static str, resource: &Resource, _: &RuleSet) -> Vec<Issue> {
    containers(resource)
        .iter()
        .filter(|c| {
            c.node
                .get("image")
                .and_then(TreeNode::as_str)
                .is_none_or(|i| i.trim().is_empty())
        })
        .map(|c| {
            Issue::new(
                Severity::Error,
                id,
                resource,
                c.path.key("image").to_string(),
                format!("Container {} missing image", c.label()),
            )
            .with_suggestion("Specify the container image to run")
        })
        .collect()
}

fn container_without_resources(id: &'static str, resource: &Resource, _: &RuleSet) -> Vec<Issue> {
    containers(resource)
        .iter()
        .filter(|c| {
            let resources = c.node.get("resources");
            is_blank(resources.and_then(|r| r.get("limits")))
                && is_blank(resources.and_then(|r| r.get("requests")))
        })
        .map(|c| {
            Issue::new(
                Severity::Info,
                id,
                resource,
                c.path.key("resources").to_string(),
                format!("Container {} has no resource requests or limits", c.label()),
            )
            .with_suggestion("Set resources.requests and resources.limits for cpu and memory")
        })
        .collect()
}

/// True for `repo:latest` and for references without a tag or digest
fn uses_floating_tag(image: &str) -> bool {
    if image.contains('@') {
        return false;
    }
    let last_component = image.rsplit('/').next().unwrap_or(image);
    match last_component.rsplit_once(':') {
        Some((_, tag)) => tag == "latest",
        None => true,
    }
}

fn image_latest_tag(id: &'static str, resource: &Resource, _: &RuleSet) -> Vec<Issue> {
    containers(resource)
        .iter()
        .filter_map(|c| {
            let image = c.node.get("image")?.as_str()?;
            (!image.trim().is_empty() && uses_floating_tag(image)).then(|| {
                Issue::new(
                    Severity::Info,
                    id,
                    resource,
                    c.path.key("image").to_string(),
                    format!("Image '{}' does not pin a version", image),
                )
                .with_suggestion("Use a specific image tag or digest")
            })
        })
        .collect()
}

fn ingress_without_rules(id: &'static str, resource: &Resource, _: &RuleSet) -> Vec<Issue> {
    if resource.kind != "Ingress" {
        return Vec::new();
    }
    let Some(spec) = resource.content.get("spec").filter(|s| !s.is_null()) else {
        return Vec::new();
    };
    if !is_blank(spec.get("rules"))
        || !is_blank(spec.get("defaultBackend"))
        || !is_blank(spec.get("backend"))
    {
        return Vec::new();
    }
    vec![
        Issue::new(
            Severity::Warning,
            id,
            resource,
            "spec",
            format!(
                "Ingress '{}' has no rules or defaultBackend",
                resource.name.as_deref().unwrap_or("unnamed")
            ),
        )
        .with_suggestion("Add routing rules or a default backend"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use kubexplain_core::{extract_all, split};

    fn run(raw: &str) -> Vec<Issue> {
        let rules = RuleSet::builtin();
        extract_all(&split(raw))
            .resources
            .iter()
            .flat_map(|r| CONSISTENCY_RULES.iter().flat_map(move |rule| rule.run(r, rules)))
            .collect()
    }

    fn rule_ids(issues: &[Issue]) -> Vec<&str> {
        issues.iter().map(|i| i.rule).collect()
    }

    #[test]
    fn test_rule_ids_are_unique() {
        let mut ids: Vec<&str> = CONSISTENCY_RULES.iter().map(|r| r.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), CONSISTENCY_RULES.len());
    }

    #[test]
    fn test_issues_carry_table_id() {
        let raw = r#"
apiVersion: v1
kind: Service
metadata:
  name: s
spec:
  ports:
  - port: 70000
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: d
spec:
  selector:
    matchLabels:
      app: web
  template:
    metadata:
      labels:
        app: api
    spec:
      containers:
      - image: nginx
        ports:
        - containerPort: 0
      - name: sidecar
---
apiVersion: networking.k8s.io/v1
kind: Ingress
metadata:
  name: i
spec:
  tls: []
---
apiVersion: v1
kind: Pdo
metadata:
  name: p
"#;
        let resources = extract_all(&split(raw)).resources;
        let rules = RuleSet::builtin();
        let mut fired = 0;
        for rule in CONSISTENCY_RULES {
            for resource in &resources {
                for issue in rule.run(resource, rules) {
                    assert_eq!(issue.rule, rule.id);
                    fired += 1;
                }
            }
        }
        assert!(fired >= 9, "only {} issues", fired);

        let renamed = ConsistencyRule {
            id: "renamed-kind-check",
            check: unknown_kind,
        };
        let issues = renamed.run(&resources[3], rules);
        assert_eq!(rule_ids(&issues), vec!["renamed-kind-check"]);
    }

    #[test]
    fn test_loadbalancer_without_ports_warns() {
        let issues = run(
            "apiVersion: v1\nkind: Service\nmetadata:\n  name: lb\nspec:\n  type: LoadBalancer\n  selector:\n    app: web\n",
        );
        assert_eq!(rule_ids(&issues), vec!["service-loadbalancer-without-ports"]);
        assert_eq!(issues[0].severity, Severity::Warning);
        assert_eq!(issues[0].path, "spec.ports");
    }

    #[test]
    fn test_cluster_ip_without_ports_errors() {
        let issues = run(
            "apiVersion: v1\nkind: Service\nmetadata:\n  name: s\nspec:\n  selector:\n    app: web\n",
        );
        assert_eq!(rule_ids(&issues), vec!["service-without-ports"]);
        assert_eq!(issues[0].severity, Severity::Error);
    }

    #[test]
    fn test_external_name_service_is_exempt() {
        let issues = run(
            "apiVersion: v1\nkind: Service\nmetadata:\n  name: ext\nspec:\n  type: ExternalName\n  externalName: db.example.com\n",
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn test_service_ports_are_checked() {
        let issues = run(r#"
apiVersion: v1
kind: Service
metadata:
  name: s
spec:
  selector:
    app: web
  ports:
  - port: 70000
    targetPort: http
  - port: "80"
    targetPort: 8080
"#);
        let paths: Vec<&str> = issues.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["spec.ports[0].port", "spec.ports[1].port"]);
        assert_eq!(issues[0].message, "Invalid port: port 70000 is outside 1-65535");
        assert_eq!(issues[1].message, "Invalid port: port must be an integer, found string");
    }

    #[test]
    fn test_deployment_container_checks() {
        let issues = run(r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
spec:
  replicas: 1
  selector:
    matchLabels:
      app: web
      tier: front
  template:
    metadata:
      labels:
        app: web
    spec:
      containers:
      - image: nginx
        ports:
        - containerPort: 0
      - name: sidecar
        image: envoy:1.29
        resources:
          limits:
            cpu: 100m
"#);
        let found: Vec<(&str, &str)> = issues.iter().map(|i| (i.rule, i.path.as_str())).collect();
        assert_eq!(
            found,
            vec![
                ("selector-label-mismatch", "spec.selector.matchLabels.tier"),
                ("container-missing-name", "spec.template.spec.containers[0].name"),
                ("container-without-resources", "spec.template.spec.containers[0].resources"),
                ("image-latest-tag", "spec.template.spec.containers[0].image"),
                (
                    "invalid-container-port",
                    "spec.template.spec.containers[0].ports[0].containerPort"
                ),
            ]
        );
    }

    #[test]
    fn test_pod_without_containers() {
        let issues = run(
            "apiVersion: v1\nkind: Pod\nmetadata:\n  name: p\nspec:\n  containers: []\n",
        );
        assert_eq!(rule_ids(&issues), vec!["pod-without-containers"]);
        assert_eq!(issues[0].path, "spec.containers");
    }

    #[test]
    fn test_cronjob_pod_spec_location() {
        let issues = run(r#"
apiVersion: batch/v1
kind: CronJob
metadata:
  name: nightly
spec:
  schedule: "0 0 * * *"
  jobTemplate:
    spec:
      template:
        spec:
          containers:
          - name: job
"#);
        let found: Vec<(&str, &str)> = issues.iter().map(|i| (i.rule, i.path.as_str())).collect();
        assert_eq!(
            found,
            vec![
                (
                    "container-missing-image",
                    "spec.jobTemplate.spec.template.spec.containers[0].image"
                ),
                (
                    "container-without-resources",
                    "spec.jobTemplate.spec.template.spec.containers[0].resources"
                ),
            ]
        );
        assert_eq!(issues[0].message, "Container 'job' missing image");
    }

    #[test]
    fn test_missing_template_is_left_to_required_rules() {
        let issues = run(
            "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: d\nspec:\n  replicas: 2\n",
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn test_ingress_without_rules() {
        let issues = run(
            "apiVersion: networking.k8s.io/v1\nkind: Ingress\nmetadata:\n  name: i\nspec:\n  tls: []\n",
        );
        assert_eq!(rule_ids(&issues), vec!["ingress-without-rules"]);

        let issues = run(
            "apiVersion: networking.k8s.io/v1\nkind: Ingress\nmetadata:\n  name: i\nspec:\n  defaultBackend:\n    service:\n      name: web\n",
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn test_unknown_kind_suggestion() {
        let issues = run("apiVersion: apps/v1\nkind: Deplyment\nmetadata:\n  name: d\n");
        assert_eq!(rule_ids(&issues), vec!["unknown-kind"]);
        assert_eq!(issues[0].severity, Severity::Info);
        assert_eq!(issues[0].suggestion.as_deref(), Some("Did you mean `Deployment`?"));

        assert!(run("apiVersion: example.com/v1\nkind: Widget\n").is_empty());
    }

    #[test]
    fn test_floating_tag_detection() {
        assert!(uses_floating_tag("nginx"));
        assert!(uses_floating_tag("nginx:latest"));
        assert!(uses_floating_tag("registry.local:5000/team/app"));
        assert!(!uses_floating_tag("registry.local:5000/team/app:1.2"));
        assert!(!uses_floating_tag("nginx@sha256:abcd"));
    }
}
