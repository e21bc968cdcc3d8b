pub fn execute() -> String {
    [
        "📖 Chartwright - describe a chart and it is drawn for you",
        "",
        "Examples:",
        "  bitcoin transaction count for the last 14 days",
        "  average bitcoin block size over 90 days as a bar chart",
        "  pie chart of a typical household budget",
        "  3d scatter of a helix",
        "",
        "Bitcoin history is limited to the last 730 days; other requests use generated data.",
        "Commands: `help` shows this message, `quit` ends the session.",
    ]
    .join("\n")
}
