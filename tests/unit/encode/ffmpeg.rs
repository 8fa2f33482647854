use super::*;

fn strings(args: &[OsString]) -> Vec<String> {
    args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
}

#[test]
fn default_args_match_frame_naming() {
    let cfg = VideoConfig::default();
    let args = strings(&build_args(
        &cfg,
        Path::new("out/frames"),
        OutputFormat::Png,
        Path::new("out/video.mp4"),
    ));
    let input = Path::new("out/frames").join("%d.png");
    let pos = |s: &str| args.iter().position(|a| a == s).unwrap();

    assert_eq!(args[pos("-start_number") + 1], "1");
    assert_eq!(args[pos("-framerate") + 1], "48");
    assert_eq!(args[pos("-i") + 1], input.to_string_lossy());
    assert_eq!(args[pos("-vcodec") + 1], "libx264");
    assert_eq!(args[pos("-crf") + 1], "23");
    assert_eq!(
        args[pos("-vf") + 1],
        "tpad=start_mode=clone:start_duration=1,tpad=stop_mode=clone:stop_duration=3,minterpolate=fps=60:mi_mode=blend"
    );
    assert!(pos("-i") < pos("-vcodec"));
    assert!(args.contains(&"-y".to_string()));
    assert_eq!(args.last().unwrap(), "out/video.mp4");
}

#[test]
fn empty_filters_omit_vf_and_extras_are_placed() {
    let cfg = VideoConfig {
        video_filters: Vec::new(),
        extra_input_args: vec!["-thread_queue_size".to_string(), "64".to_string()],
        extra_output_args: vec!["-an".to_string()],
        overwrite: false,
        ..VideoConfig::default()
    };
    let args = strings(&build_args(
        &cfg,
        Path::new("f"),
        OutputFormat::Jpeg,
        Path::new("v.mp4"),
    ));
    assert!(!args.contains(&"-vf".to_string()));
    assert!(args.contains(&"-n".to_string()));
    assert!(args.iter().any(|a| a.ends_with("%d.jpg")));
    let tq = args.iter().position(|a| a == "-thread_queue_size").unwrap();
    let vc = args.iter().position(|a| a == "-vcodec").unwrap();
    assert!(tq < vc);
    assert_eq!(&args[args.len() - 2..], &["-an".to_string(), "v.mp4".to_string()]);
}

#[test]
fn validation_rejects_nonsense() {
    assert!(VideoConfig::default().validate().is_ok());
    let zero_fps = VideoConfig {
        fps: 0,
        ..VideoConfig::default()
    };
    assert!(zero_fps.validate().is_err());
    let no_codec = VideoConfig {
        codec: " ".to_string(),
        ..VideoConfig::default()
    };
    assert!(no_codec.validate().is_err());
}

#[test]
fn missing_ffmpeg_is_an_encode_error() {
    let cfg = VideoConfig {
        ffmpeg_path: Some(PathBuf::from("/nonexistent/ffmpeg-facelapse")),
        ..VideoConfig::default()
    };
    assert!(!is_ffmpeg_available(&cfg.program()));
    let out = std::env::temp_dir().join(format!("facelapse_ffmpeg_{}.mp4", std::process::id()));
    let err = encode_frames_dir(&cfg, Path::new("frames"), OutputFormat::Png, &out).unwrap_err();
    assert_eq!(err.kind(), crate::ErrorKind::Encode);
}

#[test]
fn encodes_frames_when_ffmpeg_is_installed() {
    if !is_ffmpeg_available(Path::new("ffmpeg")) {
        return;
    }
    let dir = std::env::temp_dir().join(format!(
        "facelapse_ffmpeg_e2e_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    let frames = dir.join("frames");
    std::fs::create_dir_all(&frames).unwrap();
    for i in 1..=3u8 {
        let img = image::RgbImage::from_pixel(16, 16, image::Rgb([i * 60, 0, 0]));
        img.save(frames.join(format!("{i}.png"))).unwrap();
    }
    let cfg = VideoConfig {
        video_filters: Vec::new(),
        ..VideoConfig::default()
    };
    let out = dir.join("out").join("video.mp4");
    encode_frames_dir(&cfg, &frames, OutputFormat::Png, &out).unwrap();
    assert!(std::fs::metadata(&out).unwrap().len() > 0);
    let _ = std::fs::remove_dir_all(dir);
}
