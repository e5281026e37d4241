// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_python_module(classes: usize) -> String {
    let mut content = String::from("import os\nimport sys\n\n");

    for class in 0..classes {
        content.push_str(&format!("\n@dataclass\nclass Model{class}(Base):\n"));
        content.push_str("    \"\"\"A generated model.\"\"\"\n\n");
        for method in 0..5 {
            content.push_str(&format!(
                "    def method_{method}(self, value, scale=1.5):\n        # scale the value\n        result = (value + {method}) * scale\n        if result is not None and result > 0:\n            print(\"positive\", result)\n        return len(str(result))\n\n"
            ));
        }
    }

    content
}

#[allow(dead_code)]
pub fn generate_large_module() -> String {
    generate_python_module(500)
}
