use cluster_auditor::report::{render_json, write_report};
use cluster_auditor::service::{serve, AppState};
use cluster_auditor::{
    gather_workloads, AuditRunner, Check, Config, ExclusionPolicy, FakeCluster, Filtering,
    Finding, FindingsResponse, FindingsStore, HealthScore, OutputFormat, OutputOptions,
    WorkloadKind,
};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, PodSpec, PodTemplateSpec, SecurityContext,
};
use k8s_openapi::api::rbac::v1::{PolicyRule, Role, RoleBinding, RoleRef, Subject};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use tokio::net::TcpListener;

fn meta(name: &str, namespace: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        ..Default::default()
    }
}

fn deployment(name: &str, namespace: &str, container: Container) -> Deployment {
    Deployment {
        metadata: meta(name, namespace),
        spec: Some(DeploymentSpec {
            template: PodTemplateSpec {
                spec: Some(PodSpec {
                    containers: vec![container],
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Untagged, privileged, no resources, no probes, serving a port
fn careless_container() -> Container {
    Container {
        name: "nginx".to_string(),
        image: Some("nginx".to_string()),
        ports: Some(vec![ContainerPort {
            container_port: 80,
            ..Default::default()
        }]),
        security_context: Some(SecurityContext {
            privileged: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn system_container() -> Container {
    Container {
        name: "coredns".to_string(),
        image: Some("registry.k8s.io/coredns/coredns:v1.11.1".to_string()),
        ..Default::default()
    }
}

fn admin_role() -> (Role, RoleBinding) {
    let role = Role {
        metadata: meta("admin", "default"),
        rules: Some(vec![PolicyRule {
            verbs: vec!["*".to_string()],
            resources: Some(vec!["pods".to_string()]),
            ..Default::default()
        }]),
    };
    let binding = RoleBinding {
        metadata: meta("admin-binding", "default"),
        role_ref: RoleRef {
            api_group: "rbac.authorization.k8s.io".to_string(),
            kind: "Role".to_string(),
            name: "admin".to_string(),
        },
        subjects: Some(
            (1..=7)
                .map(|i| Subject {
                    kind: "ServiceAccount".to_string(),
                    name: format!("sa{}", i),
                    namespace: Some("default".to_string()),
                    ..Default::default()
                })
                .collect(),
        ),
    };
    (role, binding)
}

fn cluster() -> FakeCluster {
    let (role, binding) = admin_role();
    FakeCluster {
        deployments: vec![
            deployment("web", "default", careless_container()),
            deployment("coredns", "kube-system", system_container()),
        ],
        roles: vec![role],
        role_bindings: vec![binding],
        ..Default::default()
    }
}

fn config(checks: Vec<Check>) -> Config {
    Config {
        namespace: String::new(),
        checks,
        exclusions: ExclusionPolicy::builtin(),
        output: OutputOptions::default(),
        db_path: None,
    }
}

fn issues_for<'a>(findings: &'a [Finding], resource: &str) -> Vec<&'a str> {
    findings
        .iter()
        .filter(|f| f.resource == resource)
        .map(|f| f.issue.as_str())
        .collect()
}

#[tokio::test]
async fn test_full_audit_over_fake_cluster() {
    let cluster = cluster();
    let cfg = config(vec![]);
    let report = AuditRunner::new(&cluster, &cfg).run().await;

    assert!(!report.has_failures(), "{:?}", report.failures);

    let web = issues_for(&report.findings, "web");
    assert_eq!(
        web,
        vec![
            "Missing resource limits and requests",
            "Missing Readiness Probe",
            "Missing Liveness Probe",
            "Image 'nginx' resolves to tag 'latest'",
            "Container is running with privileged mode enabled",
        ]
    );

    // kube-system is excluded from the filtered checks only
    let coredns = issues_for(&report.findings, "coredns");
    assert_eq!(coredns, vec!["Missing Liveness Probe"]);

    let rbac: Vec<_> = report.findings.iter().filter(|f| f.kind == "Role").collect();
    assert_eq!(rbac.len(), 1);
    assert!(rbac[0].issue.contains("+2 more"));
    assert_eq!(rbac[0].subjects.len(), 7);

    // "default" has no NetworkPolicy but no namespaces are listed by the fake
    assert!(report.findings.iter().all(|f| f.kind != "Namespace"));

    let summary = report.summary();
    assert_eq!(summary.total_findings, 7);
    assert_eq!(summary.findings_by_kind.get("Deployment"), Some(&6));
}

#[tokio::test]
async fn test_unreachable_kind_fails_only_its_checks() {
    let cluster = cluster().fail_on("cronjobs");
    let cfg = config(vec![Check::PrivilegedContainers, Check::ImageTags, Check::Rbac]);
    let report = AuditRunner::new(&cluster, &cfg).run().await;

    assert_eq!(report.summary().failed_checks, vec!["privileged-containers"]);
    let message = report.failures[0].to_string();
    assert!(message.contains("privileged-containers"));
    assert!(message.contains("CronJob"));

    // image tags only read Deployments, rbac reads no workloads
    assert_eq!(report.findings.len(), 2);
}

#[tokio::test]
async fn test_gather_all_kinds_names_failing_kind() {
    let cluster = cluster();
    let all = gather_workloads(&cluster, "", &[]).await.unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|w| w.kind == WorkloadKind::Deployment));

    let scoped = gather_workloads(&cluster, "default", &[WorkloadKind::Deployment])
        .await
        .unwrap();
    assert_eq!(scoped.len(), 1);
    assert_eq!(scoped[0].name, "web");

    let failing = cluster.fail_on("jobs");
    let err = gather_workloads(&failing, "", &[]).await.unwrap_err();
    assert!(err.to_string().contains("Job"));
}

#[tokio::test]
async fn test_unfiltered_override_keeps_excluded_findings() {
    let cluster = cluster();
    let cfg = config(vec![Check::ResourceLimits]);
    let report = AuditRunner::new(&cluster, &cfg)
        .with_filtering(Check::ResourceLimits, Filtering::Unfiltered)
        .run()
        .await;
    let resources: Vec<_> = report.findings.iter().map(|f| f.resource.as_str()).collect();
    assert_eq!(resources, vec!["web", "coredns"]);
}

#[tokio::test]
async fn test_export_store_and_query_service() {
    let dir = tempfile::tempdir().unwrap();
    let cluster = cluster();
    let cfg = config(vec![Check::ImageTags, Check::Rbac]);
    let report = AuditRunner::new(&cluster, &cfg).run().await;
    assert_eq!(report.findings.len(), 2);

    // export
    let json_path = dir.path().join("report.json");
    write_report(&report.findings, OutputFormat::Json, json_path.to_str()).unwrap();
    let exported = std::fs::read_to_string(&json_path).unwrap();
    assert_eq!(exported, render_json(&report.findings).unwrap());

    // persist
    let db_path = dir.path().join("audit.db");
    let store = FindingsStore::open(&db_path).unwrap();
    assert_eq!(store.insert_all(&report.findings), 2);
    let stored = store.list_findings().unwrap();
    assert_eq!(stored[0].kind, "Role");
    assert_eq!(stored[0].subjects.len(), 7);
    assert_eq!(stored[1].resource, "web");
    store.close().unwrap();

    // query
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, AppState::new(&db_path)));

    let base = format!("http://{}", addr);
    let body: FindingsResponse = reqwest::get(format!("{}/v1/findings", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body.findings.len(), 2);
    assert_eq!(body.findings[0].resource, "admin");
    assert_eq!(body.findings[1].container, "nginx");

    let raw = reqwest::get(format!("{}/v1/findings", base))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(!raw.contains("subjects"));

    let score: HealthScore = reqwest::get(format!("{}/v1/health-score", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(score.score, 87.3);
    assert_eq!(score.status, "Healthy");

    let health = reqwest::get(format!("{}/healthz", base))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(health, "ok");
}
