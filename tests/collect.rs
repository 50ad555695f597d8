mod common;

use std::collections::BTreeSet;
use std::time::Duration;

use reqwest::Url;
use tokio::sync::watch;
use tokio::time::Instant;

use common::{degree, multi_role, profile_page, single_role, FakePage, FlakyProbe};
use profscrap::gate::ReachabilityGate;
use profscrap::parse::RecordParser;
use profscrap::process::{CollectOptions, ProfileCollector};
use profscrap::record::EducationRecord;
use profscrap::{Error, BACKOFF};

const LISTING: &str = "https://www.linkedin.com/company/acme/people/";
const ALICE: &str = "https://www.linkedin.com/in/alice/";
const BOB: &str = "https://www.linkedin.com/in/bob/";
const CAROL: &str = "https://www.linkedin.com/in/carol/";
const MIT: &str = "https://www.linkedin.com/school/mit/";

fn options() -> CollectOptions {
    CollectOptions {
        page_settle: Duration::from_secs(30),
        scroll_pause: Duration::from_secs(2),
    }
}

fn collector(page: FakePage, probe: FlakyProbe) -> ProfileCollector<FakePage, FlakyProbe> {
    let parser = RecordParser::new()
        .unwrap()
        .with_base(Url::parse("https://www.linkedin.com").unwrap());
    ProfileCollector::new(page, ReachabilityGate::new(probe), parser).with_options(options())
}

fn listing(hrefs: &[&str]) -> String {
    let cards: String = hrefs
        .iter()
        .map(|href| {
            format!(
                r#"<div class="org-people-profile-card__profile-info"><a class="ember-view" href="{href}">Someone</a></div>"#
            )
        })
        .collect();
    format!("<html><body>{cards}</body></html>")
}

fn profiles() -> FakePage {
    FakePage::new()
        .with_page(
            ALICE,
            profile_page(
                &[
                    single_role("Engineer", "Acme", Some("New York, NY")),
                    multi_role("Globex", &[("Intern", "Austin, TX"), ("Analyst", "Dallas, TX")]),
                ]
                .concat(),
                &degree("MIT", Some("/school/mit/")),
            ),
        )
        .with_page(
            CAROL,
            profile_page(
                &single_role("Manager", "Acme", None),
                &[degree("Stanford University", None), degree("MIT", Some(MIT))].concat(),
            ),
        )
}

#[tokio::test(start_paused = true)]
async fn discovery_scrolls_until_height_settles() {
    let page = FakePage::new()
        .with_page(LISTING, listing(&["/in/alice/", BOB, "/in/alice/", CAROL]))
        .with_heights([100, 200, 300, 300]);
    let mut collector = collector(page, FlakyProbe::up());
    let start = Instant::now();

    let ids = collector.discover_profiles(LISTING).await.unwrap();

    assert_eq!(ids, [ALICE, BOB, CAROL]);
    assert!(start.elapsed() >= Duration::from_secs(30 + 3 * 2));
    assert_eq!(collector.into_page().scrolls, 3);
}

#[tokio::test(start_paused = true)]
async fn discovery_stops_when_height_never_grows() {
    let page = FakePage::new()
        .with_page(LISTING, listing(&[BOB]))
        .with_heights([500]);
    let mut collector = collector(page, FlakyProbe::up());

    let ids = collector.discover_profiles(LISTING).await.unwrap();

    assert_eq!(ids, [BOB]);
    assert_eq!(collector.into_page().scrolls, 1);
}

#[tokio::test(start_paused = true)]
async fn failed_profile_is_skipped_and_the_rest_collected() {
    let ids = [ALICE.to_string(), BOB.to_string(), CAROL.to_string()];
    let mut collector = collector(profiles(), FlakyProbe::up());

    let collection = collector.collect(&ids, None, 1234).await.unwrap();

    assert_eq!(collection.failed, [BOB]);
    assert_eq!(collection.experiences.len(), 4);
    let alice: Vec<_> = collection
        .experiences
        .iter()
        .filter(|r| r.profile_id == ALICE)
        .collect();
    assert_eq!(alice.len(), 3);
    assert_eq!(alice[1].company.as_deref(), Some("Globex"));
    assert_eq!(alice[2].company.as_deref(), Some("Globex"));
    assert_eq!(alice[2].title.as_deref(), Some("Analyst"));

    let carol_job = collection
        .experiences
        .iter()
        .find(|r| r.profile_id == CAROL)
        .unwrap();
    assert_eq!(carol_job.location, None);

    assert_eq!(collection.education.len(), 3);
    assert!(collection.education.iter().all(|r| !r.profile_id.is_empty()));
    assert_eq!(collection.school_refs, BTreeSet::from([MIT.to_string()]));
}

#[tokio::test(start_paused = true)]
async fn expanded_sections_are_read_after_clicking() {
    let collapsed = profile_page(&single_role("Engineer", "Acme", None), "");
    let expanded = profile_page(&single_role("Engineer", "Acme", Some("Berlin, Germany")), "");
    let page = FakePage::new()
        .with_page(ALICE, collapsed)
        .with_expanded(ALICE, expanded);
    let mut collector = collector(page, FlakyProbe::up());

    let collection = collector.collect(&[ALICE.to_string()], None, 0).await.unwrap();

    assert_eq!(
        collection.experiences[0].location.as_deref(),
        Some("Berlin, Germany")
    );
}

#[tokio::test(start_paused = true)]
async fn seeded_sample_visits_the_same_profiles() {
    let ids: Vec<String> = (0..20)
        .map(|i| format!("https://www.linkedin.com/in/p{i}/"))
        .collect();
    let page = || {
        ids.iter().fold(FakePage::new(), |page, id| {
            page.with_page(id, profile_page(&single_role("Engineer", "Acme", None), ""))
        })
    };

    let mut first = collector(page(), FlakyProbe::up());
    first.collect(&ids, Some(5), 1234).await.unwrap();
    let mut second = collector(page(), FlakyProbe::up());
    second.collect(&ids, Some(5), 1234).await.unwrap();

    let first = first.into_page().visits;
    assert_eq!(first.len(), 5);
    assert_eq!(first, second.into_page().visits);
}

#[tokio::test(start_paused = true)]
async fn oversized_sample_fails_before_navigating() {
    let mut collector = collector(profiles(), FlakyProbe::up());
    let err = collector
        .collect(&[ALICE.to_string()], Some(2), 1234)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SampleTooLarge { .. }));
    assert!(collector.into_page().visits.is_empty());
}

#[tokio::test(start_paused = true)]
async fn navigation_waits_for_the_site() {
    let mut collector = collector(profiles(), FlakyProbe::failing(1));
    let start = Instant::now();

    let collection = collector.collect(&[ALICE.to_string()], None, 0).await.unwrap();

    assert_eq!(collection.experiences.len(), 3);
    assert!(start.elapsed() >= BACKOFF);
}

#[tokio::test(start_paused = true)]
async fn cancelled_gate_ends_the_run() {
    let (tx, rx) = watch::channel(false);
    let parser = RecordParser::new().unwrap();
    let gate = ReachabilityGate::new(FlakyProbe::failing(usize::MAX)).with_cancel(rx);
    let mut collector = ProfileCollector::new(profiles(), gate, parser);
    tx.send(true).unwrap();

    let err = collector
        .collect(&[ALICE.to_string(), CAROL.to_string()], None, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled));
}

#[tokio::test(start_paused = true)]
async fn school_pages_fill_degree_locations() {
    let stanford = "https://www.linkedin.com/school/stanford/";
    let page = FakePage::new()
        .with_page(
            MIT,
            r#"<html><body><div class="org-top-card-summary-info-list__info-item">Cambridge, MA</div></body></html>"#,
        )
        .with_page(stanford, "<html><body><h1>Stanford</h1></body></html>");
    let mut collector = collector(page, FlakyProbe::up());
    let row = |school_ref: Option<&str>, location: Option<&str>| EducationRecord {
        school_ref: school_ref.map(Into::into),
        location: location.map(Into::into),
        ..Default::default()
    };
    let mut education = vec![
        row(Some(MIT), None),
        row(Some(stanford), None),
        row(Some(MIT), Some("Boston")),
        row(None, None),
    ];
    let refs = BTreeSet::from([MIT.to_string(), stanford.to_string()]);

    let filled = collector
        .resolve_school_locations(&refs, &mut education)
        .await
        .unwrap();

    assert_eq!(filled, 1);
    let locations: Vec<_> = education.iter().map(|r| r.location.as_deref()).collect();
    assert_eq!(locations, [Some("Cambridge, MA"), None, Some("Boston"), None]);
}
