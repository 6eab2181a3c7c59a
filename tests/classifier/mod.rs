mod archive_content;
