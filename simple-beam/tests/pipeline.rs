use std::time::Duration;

use approx::assert_relative_eq;
use fea_engine::analysis::ActiveDofs;
use simple_beam::scenario::PINNED;
use simple_beam::{
    AnalysisEngine, AnalysisRunner, EntityKind, ModelBuilder, NativeEngine, Pipeline, PipelineConfig,
    PipelineError, PipelineState, ResultExtractor, ResultWriter, Stage, TwoSpanBeam, CSV_HEADER,
};

fn native_pipeline(dir: &std::path::Path) -> Pipeline {
    Pipeline::new(PipelineConfig::new(dir), Box::new(NativeEngine::new()))
}

/// Built, saved and analyzed two-span beam, driven component by component
fn analyzed_engine(dir: &std::path::Path) -> NativeEngine {
    let mut engine = NativeEngine::new();
    TwoSpanBeam::default()
        .build(&mut ModelBuilder::new(&mut engine))
        .unwrap();
    let mut runner = AnalysisRunner::new(&mut engine);
    runner.save_model(dir, "SimpleBeam").unwrap();
    runner.set_active_dofs(ActiveDofs::plane_xz()).unwrap();
    runner.run_analysis(Duration::from_secs(60)).unwrap();
    runner.select_output_cases(&["DEAD"]).unwrap();
    engine
}

#[test]
fn two_span_run_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let report = native_pipeline(dir.path()).run().unwrap();

    assert!(report.model_path.ends_with("SimpleBeam.json"));
    assert!(report.model_path.is_file());

    let extraction = &report.extraction;
    assert_eq!(extraction.reactions.len(), 3);
    assert!(extraction.reactions.iter().all(|(_, records)| records.len() == 1));
    assert_eq!(extraction.forces.len(), 2);
    assert!(extraction.no_results.is_empty());
    assert!(extraction.skipped.is_empty());
    assert_relative_eq!(extraction.reaction_total()[2], 98.0, epsilon = 1e-6);

    let m_b = -(320.0 + 172.8) / 18.0;
    let fz: Vec<f64> = extraction
        .reactions
        .iter()
        .map(|(_, records)| records[0].fz)
        .collect();
    assert_relative_eq!(fz[0], 40.0 + m_b / 4.0, epsilon = 1e-6);
    assert_relative_eq!(fz[2], 7.2 + m_b / 5.0, epsilon = 1e-6);

    let csv = std::fs::read_to_string(&report.results_path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], CSV_HEADER);
    assert_eq!(lines.len(), 1 + 3 + 6);
    assert!(lines[1..4].iter().all(|line| line.starts_with("1,")));
    assert!(lines[4..].iter().all(|line| line.starts_with("2,")));
}

#[test]
fn csv_rewrite_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let report = native_pipeline(dir.path()).run().unwrap();
    let first = std::fs::read(&report.results_path).unwrap();

    ResultWriter::write_csv(&report.results_path, &report.extraction.force_records()).unwrap();
    assert_eq!(first, std::fs::read(&report.results_path).unwrap());
}

#[test]
fn geometry_and_restraints_read_back() {
    let mut engine = NativeEngine::new();
    let scenario = TwoSpanBeam::default();
    let built = scenario.build(&mut ModelBuilder::new(&mut engine)).unwrap();

    assert_eq!(built.frames.len(), 2);
    for (frame, (start, end)) in built.frames.iter().zip(scenario.spans) {
        let (i, j) = engine.frame_endpoints(frame).unwrap();
        assert_eq!(engine.point_coordinates(&i).unwrap(), start);
        assert_eq!(engine.point_coordinates(&j).unwrap(), end);
    }
    for node in &built.supports {
        assert_eq!(engine.restraint(node).unwrap(), PINNED);
    }
    assert_eq!(engine.restraint(&built.loaded_point).unwrap(), [false; 6]);
}

#[test]
fn empty_case_gives_zero_reactions() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = NativeEngine::new();
    let built = TwoSpanBeam::default()
        .build(&mut ModelBuilder::new(&mut engine))
        .unwrap();
    ModelBuilder::new(&mut engine).define_load_case("EMPTY", 0.0).unwrap();

    let mut runner = AnalysisRunner::new(&mut engine);
    runner.save_model(dir.path(), "SimpleBeam").unwrap();
    runner.set_active_dofs(ActiveDofs::plane_xz()).unwrap();
    runner.run_analysis(Duration::from_secs(60)).unwrap();
    runner.select_output_cases(&["EMPTY"]).unwrap();

    let extractor = ResultExtractor::new(&engine);
    for node in &built.supports {
        let records = extractor.get_reactions(node).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].load_case, "EMPTY");
        for value in records[0].as_array() {
            assert_relative_eq!(value, 0.0, epsilon = 1e-9);
        }
    }
}

#[test]
fn forces_before_analysis_or_when_deselected_are_empty() {
    let mut engine = NativeEngine::new();
    let built = TwoSpanBeam::default()
        .build(&mut ModelBuilder::new(&mut engine))
        .unwrap();
    assert!(ResultExtractor::new(&engine)
        .get_frame_forces(&built.frames[0])
        .unwrap()
        .is_empty());

    let dir = tempfile::tempdir().unwrap();
    let mut engine = analyzed_engine(dir.path());
    assert_eq!(
        ResultExtractor::new(&engine).get_frame_forces("2").unwrap().len(),
        6
    );
    AnalysisRunner::new(&mut engine).select_output_cases(&[]).unwrap();
    let extractor = ResultExtractor::new(&engine);
    assert!(extractor.get_frame_forces("2").unwrap().is_empty());
    assert!(extractor.get_reactions("1").unwrap().is_empty());
}

#[test]
fn unknown_output_case_is_a_reference_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = analyzed_engine(dir.path());
    let err = AnalysisRunner::new(&mut engine)
        .select_output_cases(&["DEAD", "SNOW"])
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Reference {
            stage: Stage::Analyze,
            kind: EntityKind::LoadCase,
            ..
        }
    ));
}

#[test]
fn analysis_without_save_fails() {
    let mut engine = NativeEngine::new();
    TwoSpanBeam::default()
        .build(&mut ModelBuilder::new(&mut engine))
        .unwrap();
    let err = AnalysisRunner::new(&mut engine)
        .run_analysis(Duration::from_secs(60))
        .unwrap_err();
    assert!(matches!(err, PipelineError::Analysis { stage: Stage::Analyze, .. }));
}

#[test]
fn unwritable_output_directory_fails_at_save() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("taken");
    std::fs::write(&blocker, "file, not directory").unwrap();

    let mut pipeline = native_pipeline(&blocker);
    pipeline.build().unwrap();
    let err = pipeline.save().unwrap_err();
    assert!(matches!(err, PipelineError::Io { stage: Stage::Save, .. }));
    assert_eq!(pipeline.state(), PipelineState::ModelBuilt);
}

#[test]
fn steps_out_of_order_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut pipeline = native_pipeline(dir.path());
    pipeline.build().unwrap();
    pipeline.save().unwrap();

    assert!(matches!(
        pipeline.extract(),
        Err(PipelineError::OutOfOrder {
            stage: Stage::Extract,
            state: PipelineState::Saved
        })
    ));
    pipeline.analyze().unwrap();
    pipeline.extract().unwrap();
    pipeline.write().unwrap();
    assert_eq!(pipeline.state(), PipelineState::Written);
    assert!(matches!(pipeline.analyze(), Err(PipelineError::OutOfOrder { .. })));
}

#[test]
fn unknown_engine_fails_to_connect() {
    let mut config = PipelineConfig::new("unused");
    config.engine = "sap2000".to_string();
    let err = Pipeline::connect(config).err().unwrap();
    assert_eq!(err.stage(), Stage::Connect);
}

#[test]
fn custom_scenario_and_denser_stations() {
    let dir = tempfile::tempdir().unwrap();
    let engine = NativeEngine::new()
        .with_merge_tolerance(1e-9)
        .with_stations(fea_engine::mesh::StationOptions::with_max_spacing(0.5));
    let scenario = TwoSpanBeam {
        point_load: [0.0, 0.0, -30.0, 0.0, 0.0, 0.0],
        ..TwoSpanBeam::default()
    };
    let total = scenario.total_vertical_load();

    let mut pipeline = Pipeline::new(PipelineConfig::new(dir.path()), Box::new(engine)).with_scenario(scenario);
    assert_eq!(pipeline.config().model_name, "SimpleBeam");
    let run_id = pipeline.run_id();
    pipeline.build().unwrap();
    assert_eq!(pipeline.engine().units().map(|u| u.label()), Some("kN_m_C"));
    pipeline.save().unwrap();
    assert!(pipeline.model_path().unwrap().is_file());
    pipeline.analyze().unwrap();

    let extraction = pipeline.extract().unwrap();
    assert_relative_eq!(extraction.reaction_total()[2], total, epsilon = 1e-6);
    assert_relative_eq!(total, 110.0, epsilon = 1e-12);
    // 4 m at 0.5 m spacing: 9 stations
    assert_eq!(extraction.forces[0].1.len(), 9);
    assert_ne!(run_id, uuid::Uuid::nil());
}
